//! Deferred results and the recursive resolver.
//!
//! A [`Deferred`] wraps a conversion result that is not yet available. The
//! placeholder travels inside composite [`TypedValue`]s like any other
//! value; [`resolve`] walks a produced structure, awaits every deferred it
//! finds at any depth, and keeps walking what the awaited futures return
//! until the value contains no placeholder at all.
//!
//! Suspension only ever enters a conversion through two points: the gated
//! registry's gate wait and user-supplied async codecs/loaders. Everything
//! else is plain structural recursion on a single logical task.

use std::collections::BTreeMap;
use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::ConvertError;
use crate::value::TypedValue;

/// Placeholder for a typed value still being produced.
///
/// The distinguishing structural tag is the [`TypedValue::Deferred`]
/// variant itself, so the resolver can detect a pending result at any
/// depth inside sequences, sets, tuples, mappings, records, and custom
/// values.
pub struct Deferred {
    future: BoxFuture<'static, Result<TypedValue, ConvertError>>,
}

impl Deferred {
    pub fn new<F>(future: F) -> Deferred
    where
        F: Future<Output = Result<TypedValue, ConvertError>> + Send + 'static,
    {
        Deferred {
            future: future.boxed(),
        }
    }

    /// Awaits the wrapped future once, consuming the placeholder. The
    /// produced value may itself contain further deferreds; [`resolve`]
    /// handles that.
    pub async fn resolve(self) -> Result<TypedValue, ConvertError> {
        self.future.await
    }
}

/// Fully materializes `value`: awaits every [`Deferred`] found at any
/// depth, descending into sequences, sets, tuples, mappings, records, and
/// custom values, until no placeholder remains.
///
/// Set elements are re-deduplicated after resolution, since two distinct
/// placeholders may resolve to equal values.
pub fn resolve(value: TypedValue) -> BoxFuture<'static, Result<TypedValue, ConvertError>> {
    async move {
        match value {
            TypedValue::Deferred(pending) => resolve(pending.resolve().await?).await,
            TypedValue::Seq(items) => Ok(TypedValue::Seq(resolve_all(items).await?)),
            TypedValue::Tuple(items) => Ok(TypedValue::Tuple(resolve_all(items).await?)),
            TypedValue::Set(items) => {
                let mut out: Vec<TypedValue> = Vec::with_capacity(items.len());
                for item in items {
                    let resolved = resolve(item).await?;
                    if !out.contains(&resolved) {
                        out.push(resolved);
                    }
                }
                Ok(TypedValue::Set(out))
            }
            TypedValue::Map(entries) => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    out.insert(key, resolve(item).await?);
                }
                Ok(TypedValue::Map(out))
            }
            TypedValue::Record { def, fields } => Ok(TypedValue::Record {
                def,
                fields: resolve_all(fields).await?,
            }),
            TypedValue::Custom { def, inner } => Ok(TypedValue::Custom {
                def,
                inner: Box::new(resolve(*inner).await?),
            }),
            leaf => Ok(leaf),
        }
    }
    .boxed()
}

async fn resolve_all(items: Vec<TypedValue>) -> Result<Vec<TypedValue>, ConvertError> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(resolve(item).await?);
    }
    Ok(out)
}
