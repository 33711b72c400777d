//! Custom codec hooks.

use serde_json::Value;

use crate::convert::{Load, LoadContext, Store, StoreContext};
use crate::error::ConvertError;
use crate::shape::{CodecKind, Shape};
use crate::value::TypedValue;

/// Converts custom opaque shapes by deferring entirely to the codec the
/// shape's definition carries, rather than describing the type
/// structurally.
///
/// A synchronous codec decodes in place. An asynchronous codec produces a
/// deferred result that resolves to the decoded value; this is the
/// user-supplied suspension point of the engine. Either way the decoded
/// inner value is wrapped in [`TypedValue::Custom`] so the store
/// direction can dispatch back to the same codec from the value's tag.
pub struct HookConverter;

impl Load for HookConverter {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Custom(_))
    }

    fn load(
        &self,
        _ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        let Shape::Custom(def) = shape else {
            return Err(ConvertError::NoLoader {
                shape: shape.to_string(),
            });
        };
        match def.codec() {
            CodecKind::Sync(codec) => {
                let inner = codec.decode(value)?;
                Ok(TypedValue::custom(def.clone(), inner))
            }
            CodecKind::Async(codec) => {
                let codec = codec.clone();
                let def = def.clone();
                let value = value.clone();
                Ok(TypedValue::deferred(async move {
                    let inner = codec.decode(value).await?;
                    Ok(TypedValue::custom(def, inner))
                }))
            }
        }
    }
}

impl Store for HookConverter {
    fn can_store(&self, value: &TypedValue) -> bool {
        matches!(value, TypedValue::Custom { .. })
    }

    fn store(&self, _ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        match value {
            TypedValue::Custom { def, inner } => match def.codec() {
                CodecKind::Sync(codec) => codec.encode(inner),
                CodecKind::Async(codec) => codec.encode(inner),
            },
            other => Err(ConvertError::NoStore {
                kind: other.kind().to_string(),
            }),
        }
    }
}
