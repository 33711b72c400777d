//! Top-level convenience entry points.
//!
//! These assemble the default converter registries and drive one
//! conversion each: [`to_json`] for the store direction, [`from_json`]
//! for synchronous loading, and [`from_json_async`] for loading that may
//! suspend, followed by full deferred resolution.
//!
//! The default registry comes in two flavors selected by the record
//! policy: [`registry`] rejects unknown record fields, while
//! [`registry_lenient`] tolerates them. Both are shared, immutable
//! instances; layer custom converters over them with the `with_*` methods
//! without affecting other call sites.

use std::sync::{Arc, LazyLock};

use serde_json::Value;

use crate::convert::{Load, LoadContext, Store, StoreContext};
use crate::converters::{
    AnyConverter, DateTimeConverter, EnumConverter, HookConverter, MapConverter, ParamLoader,
    RecordConverter, RefLoader, ScalarConverter, SeqConverter, TupleConverter, UnionLoader,
};
use crate::deferred::resolve;
use crate::error::ConvertError;
use crate::registry::ConverterRegistry;
use crate::shape::Shape;
use crate::value::TypedValue;

fn build_registry(record: RecordConverter) -> ConverterRegistry {
    ConverterRegistry::new()
        .with_converter(Arc::new(ScalarConverter))
        .with_loader(Arc::new(AnyConverter))
        .with_converter(Arc::new(SeqConverter))
        .with_converter(Arc::new(TupleConverter))
        .with_converter(Arc::new(MapConverter))
        .with_converter(Arc::new(HookConverter))
        .with_converter(Arc::new(EnumConverter))
        .with_converter(Arc::new(DateTimeConverter))
        .with_converter(Arc::new(record))
        // Loaders for shapes that have no stored counterpart.
        .with_loader(Arc::new(ParamLoader))
        .with_loader(Arc::new(UnionLoader))
        .with_loader(Arc::new(RefLoader))
}

static STRICT: LazyLock<ConverterRegistry> =
    LazyLock::new(|| build_registry(RecordConverter::strict()));

static LENIENT: LazyLock<ConverterRegistry> =
    LazyLock::new(|| build_registry(RecordConverter::permissive()));

/// The default registry: rejects unknown record fields.
pub fn registry() -> ConverterRegistry {
    STRICT.clone()
}

/// The permissive default registry: tolerates unknown record fields.
pub fn registry_lenient() -> ConverterRegistry {
    LENIENT.clone()
}

fn load_context(loader: Arc<dyn Load>, shape: &Shape, sync_only: bool) -> LoadContext {
    let mut ctx = LoadContext::with_root(loader, sync_only);
    // A record target is its own enclosing type, so top-level
    // self-references inside its fields resolve.
    if let Shape::Record(inst) = shape {
        ctx.set_enclosing(inst.def.clone());
    }
    ctx
}

/// Synchronously loads `value` into a typed value of `shape` using the
/// strict default registry.
///
/// Fails with [`ConvertError::AsyncInSyncContext`] if any converter in
/// the tree produces a deferred result.
pub fn from_json(shape: &Shape, value: &Value) -> Result<TypedValue, ConvertError> {
    from_json_with(Arc::new(registry()), shape, value)
}

/// [`from_json`] with the permissive default registry.
pub fn from_json_lenient(shape: &Shape, value: &Value) -> Result<TypedValue, ConvertError> {
    from_json_with(Arc::new(registry_lenient()), shape, value)
}

/// Synchronously loads through a caller-supplied loader (usually a
/// registry layered over the default one).
pub fn from_json_with(
    loader: Arc<dyn Load>,
    shape: &Shape,
    value: &Value,
) -> Result<TypedValue, ConvertError> {
    load_context(loader, shape, true).des(value, shape)
}

/// Loads `value` into a typed value of `shape`, permitting converters to
/// suspend, then fully resolves every deferred result at any depth before
/// returning.
pub async fn from_json_async(shape: &Shape, value: &Value) -> Result<TypedValue, ConvertError> {
    from_json_async_with(Arc::new(registry()), shape, value).await
}

/// [`from_json_async`] with the permissive default registry.
pub async fn from_json_async_lenient(
    shape: &Shape,
    value: &Value,
) -> Result<TypedValue, ConvertError> {
    from_json_async_with(Arc::new(registry_lenient()), shape, value).await
}

/// Asynchronous load through a caller-supplied loader.
pub async fn from_json_async_with(
    loader: Arc<dyn Load>,
    shape: &Shape,
    value: &Value,
) -> Result<TypedValue, ConvertError> {
    let partial = load_context(loader, shape, false).des(value, shape)?;
    resolve(partial).await
}

/// Stores a typed value back into a dynamic JSON value using the default
/// registry.
///
/// Fails with [`ConvertError::NoStore`] when no converter accepts the
/// value's runtime tag (a pending deferred result, for instance, has no
/// stored form).
pub fn to_json(value: &TypedValue) -> Result<Value, ConvertError> {
    to_json_with(Arc::new(registry()), value)
}

/// Store through a caller-supplied converter set.
pub fn to_json_with(store: Arc<dyn Store>, value: &TypedValue) -> Result<Value, ConvertError> {
    StoreContext::new(store).ser(value)
}
