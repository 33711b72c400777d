//! Converter contracts and the per-call conversion contexts.
//!
//! A converter is a predicate plus a transform for one family of shapes:
//! [`Load`] for the load direction (dynamic value → typed value), [`Store`]
//! for the store direction (typed value → dynamic value), [`Converter`] for
//! both. `can_load`/`can_store` are pure and deterministic; `load` is only
//! invoked after `can_load` accepted the shape, but must still fail with a
//! shape mismatch when the *value* does not fit: the predicate checks
//! shape compatibility, not value well-formedness.
//!
//! The contexts carry recursion state through a single top-level call:
//! bound generic parameters, the enclosing record (for forward-reference
//! resolution), the sync-only flag, and the lazily bound dispatch root.
//! Contexts are copied, never shared, when entering a nested scope, so
//! nested mutations cannot leak back out.

use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::ConvertError;
use crate::shape::{RecordDef, Shape};
use crate::value::TypedValue;

/// Load-direction converter: dynamic value → typed value.
pub trait Load: Send + Sync {
    /// Whether this converter handles `shape`. Pure and side-effect-free;
    /// the registry may cache the answer per distinct shape.
    fn can_load(&self, shape: &Shape) -> bool;

    /// Converts `value` to a typed value of `shape`. Called only when
    /// [`can_load`](Load::can_load) returned true for `shape`; recurses
    /// into nested shapes through `ctx`.
    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError>;
}

/// Store-direction converter: typed value → dynamic value.
///
/// Dispatch is on the runtime tag of the value; there is no target shape.
pub trait Store: Send + Sync {
    /// Whether this converter handles values with `value`'s runtime tag.
    fn can_store(&self, value: &TypedValue) -> bool;

    /// Converts `value` back to a dynamic value. Called only when
    /// [`can_store`](Store::can_store) returned true.
    fn store(&self, ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError>;
}

/// A converter that handles both directions for one shape family.
pub trait Converter: Load + Store {}

impl<T: Load + Store> Converter for T {}

/// Load-direction converter whose work suspends.
///
/// Implementations are bridged into the synchronous dispatch through
/// [`DeferredLoad`], which returns a [`TypedValue::Deferred`] placeholder
/// instead of awaiting in place. This is one of the two suspension points
/// of the engine (the other is the gated registry).
#[async_trait]
pub trait AsyncLoad: Send + Sync {
    /// Same contract as [`Load::can_load`].
    fn can_load(&self, shape: &Shape) -> bool;

    /// Asynchronous load. Receives owned copies because the produced
    /// future outlives the synchronous call that created it.
    async fn load(
        &self,
        ctx: &mut LoadContext,
        value: Value,
        shape: Shape,
    ) -> Result<TypedValue, ConvertError>;
}

/// Bridges an [`AsyncLoad`] into the synchronous [`Load`] dispatch by
/// producing a deferred placeholder.
pub struct DeferredLoad<A> {
    inner: Arc<A>,
}

impl<A> DeferredLoad<A> {
    pub fn new(inner: A) -> DeferredLoad<A> {
        DeferredLoad {
            inner: Arc::new(inner),
        }
    }
}

impl<A: AsyncLoad + 'static> Load for DeferredLoad<A> {
    fn can_load(&self, shape: &Shape) -> bool {
        self.inner.can_load(shape)
    }

    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        let inner = Arc::clone(&self.inner);
        let mut branch = ctx.branch();
        let value = value.clone();
        let shape = shape.clone();
        Ok(TypedValue::deferred(async move {
            inner.load(&mut branch, value, shape).await
        }))
    }
}

/// Synchronous codec capability for a custom shape.
pub trait Codec: Send + Sync {
    /// Decodes the dynamic value into the custom type's inner
    /// representation.
    fn decode(&self, value: &Value) -> Result<TypedValue, ConvertError>;

    /// Encodes the inner representation back to a dynamic value.
    fn encode(&self, inner: &TypedValue) -> Result<Value, ConvertError>;
}

/// Asynchronous codec capability: decoding suspends, encoding does not
/// (store-direction conversion never suspends).
#[async_trait]
pub trait AsyncCodec: Send + Sync {
    async fn decode(&self, value: Value) -> Result<TypedValue, ConvertError>;

    fn encode(&self, inner: &TypedValue) -> Result<Value, ConvertError>;
}

/// Recursion state for one load call tree.
///
/// Created at the top-level entry point, passed by reference down the
/// recursive call tree, and copied with [`branch`](LoadContext::branch) at
/// generic/record boundaries. The dispatch root binds lazily and
/// monotonically: the first registry that receives an unbound context
/// becomes its root for the remainder of the call tree.
#[derive(Clone)]
pub struct LoadContext {
    params: FxHashMap<String, Shape>,
    enclosing: Option<Arc<RecordDef>>,
    sync_only: bool,
    root: Option<Arc<dyn Load>>,
}

impl LoadContext {
    /// Unbound context; the first registry to receive it becomes its root.
    pub fn new(sync_only: bool) -> LoadContext {
        LoadContext {
            params: FxHashMap::default(),
            enclosing: None,
            sync_only,
            root: None,
        }
    }

    /// Context bound to `root` up front, as the entry points build it.
    pub fn with_root(root: Arc<dyn Load>, sync_only: bool) -> LoadContext {
        LoadContext {
            params: FxHashMap::default(),
            enclosing: None,
            sync_only,
            root: Some(root),
        }
    }

    /// Whether a dispatch root has been bound.
    pub fn is_bound(&self) -> bool {
        self.root.is_some()
    }

    /// Binds the dispatch root if none is bound yet; a no-op afterwards.
    /// The binding never resets within one call tree.
    pub fn submit_root(&mut self, root: Arc<dyn Load>) {
        if self.root.is_none() {
            self.root = Some(root);
        }
    }

    /// Whether deferred results are forbidden in this call tree.
    pub fn sync_only(&self) -> bool {
        self.sync_only
    }

    /// The enclosing record, if any; forward references resolve against
    /// its declaring scope.
    pub fn enclosing(&self) -> Option<&Arc<RecordDef>> {
        self.enclosing.as_ref()
    }

    pub fn set_enclosing(&mut self, def: Arc<RecordDef>) {
        self.enclosing = Some(def);
    }

    /// The shape bound to a generic parameter, if any.
    pub fn param(&self, name: &str) -> Option<&Shape> {
        self.params.get(name)
    }

    /// Binds a generic parameter for this context (and its branches).
    pub fn bind_param(&mut self, name: impl Into<String>, shape: Shape) {
        self.params.insert(name.into(), shape);
    }

    /// Copies this context for a nested scope. Mutations of the branch do
    /// not leak back into the parent.
    pub fn branch(&self) -> LoadContext {
        self.clone()
    }

    /// Dispatches one nested load through the bound root.
    ///
    /// In a sync-only context, a deferred result is rejected here, right
    /// after the delegated call returns, instead of being silently
    /// returned up the tree.
    pub fn des(&mut self, value: &Value, shape: &Shape) -> Result<TypedValue, ConvertError> {
        let root = self.root.clone().ok_or(ConvertError::UnboundContext)?;
        let result = root.load(self, value, shape)?;
        if self.sync_only && result.is_deferred() {
            return Err(ConvertError::AsyncInSyncContext);
        }
        Ok(result)
    }
}

/// Recursion state for one store call tree.
///
/// Store dispatch is unconditional: there is no target shape, the bound
/// root picks a converter from the value's runtime tag.
pub struct StoreContext {
    root: Arc<dyn Store>,
}

impl StoreContext {
    pub fn new(root: Arc<dyn Store>) -> StoreContext {
        StoreContext { root }
    }

    /// Dispatches one nested store through the bound root.
    pub fn ser(&mut self, value: &TypedValue) -> Result<Value, ConvertError> {
        let root = self.root.clone();
        root.store(self, value)
    }
}
