//! Ordered, first-match converter registries.
//!
//! A registry owns an ordered list of converters; registration order is
//! significant and the first converter whose predicate accepts wins. The
//! chosen converter is cached per registry instance (keyed by shape on the
//! load side, by value tag on the store side) so hot, repeated shapes do
//! not pay an O(n) scan each time. The cache is never shared between
//! registry instances: `with_*` copies start with a fresh one.
//!
//! Registries are immutable after construction and cheap to clone; a clone
//! shares the same instance (including its cache) and may be used from
//! many concurrent top-level conversions. The one designed exception to
//! immutability is [`GatedRegistry`], which blocks every load on a
//! one-shot [`ReleaseGate`] until it is opened.

use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{instrument, trace};

use crate::convert::{Converter, Load, LoadContext, Store, StoreContext};
use crate::error::ConvertError;
use crate::shape::Shape;
use crate::value::{TypedKind, TypedValue};

/// Ordered collection of load-direction converters.
#[derive(Clone)]
pub struct LoaderRegistry {
    shared: Arc<LoaderShared>,
}

struct LoaderShared {
    loaders: Vec<Arc<dyn Load>>,
    // Cached first-match choice per distinct shape, misses included.
    choices: RwLock<FxHashMap<Shape, Option<usize>>>,
}

impl LoaderRegistry {
    pub fn new(loaders: impl IntoIterator<Item = Arc<dyn Load>>) -> LoaderRegistry {
        LoaderRegistry {
            shared: Arc::new(LoaderShared {
                loaders: loaders.into_iter().collect(),
                choices: RwLock::new(FxHashMap::default()),
            }),
        }
    }

    /// New registry with `loader` appended after all existing converters
    /// (lowest priority). The receiver is left untouched and the copy
    /// starts with a fresh choice cache.
    #[must_use]
    pub fn with_loader(&self, loader: Arc<dyn Load>) -> LoaderRegistry {
        let mut loaders = self.shared.loaders.clone();
        loaders.push(loader);
        LoaderRegistry::new(loaders)
    }

    pub fn len(&self) -> usize {
        self.shared.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.loaders.is_empty()
    }

    /// First registered converter accepting `shape`, if any. Deterministic
    /// for a fixed registry; the decision is cached per distinct shape.
    pub fn find(&self, shape: &Shape) -> Option<Arc<dyn Load>> {
        if let Some(choice) = self
            .shared
            .choices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(shape)
        {
            return choice.map(|i| Arc::clone(&self.shared.loaders[i]));
        }
        let choice = self
            .shared
            .loaders
            .iter()
            .position(|loader| loader.can_load(shape));
        trace!(shape = %shape, chosen = ?choice, "loader scan");
        self.shared
            .choices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(shape.clone(), choice);
        choice.map(|i| Arc::clone(&self.shared.loaders[i]))
    }
}

impl Load for LoaderRegistry {
    fn can_load(&self, shape: &Shape) -> bool {
        self.find(shape).is_some()
    }

    #[instrument(skip_all, fields(shape = %shape), err)]
    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        if !ctx.is_bound() {
            ctx.submit_root(Arc::new(self.clone()));
        }
        let loader = self.find(shape).ok_or_else(|| ConvertError::NoLoader {
            shape: shape.to_string(),
        })?;
        loader.load(ctx, value, shape)
    }
}

/// Ordered collection of store-direction converters.
#[derive(Clone)]
pub struct StoreRegistry {
    shared: Arc<StoreShared>,
}

struct StoreShared {
    stores: Vec<Arc<dyn Store>>,
    choices: RwLock<FxHashMap<TypedKind, Option<usize>>>,
}

impl StoreRegistry {
    pub fn new(stores: impl IntoIterator<Item = Arc<dyn Store>>) -> StoreRegistry {
        StoreRegistry {
            shared: Arc::new(StoreShared {
                stores: stores.into_iter().collect(),
                choices: RwLock::new(FxHashMap::default()),
            }),
        }
    }

    /// Store-side mirror of [`LoaderRegistry::with_loader`].
    #[must_use]
    pub fn with_store(&self, store: Arc<dyn Store>) -> StoreRegistry {
        let mut stores = self.shared.stores.clone();
        stores.push(store);
        StoreRegistry::new(stores)
    }

    pub fn len(&self) -> usize {
        self.shared.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.stores.is_empty()
    }

    /// First registered converter accepting the value's runtime tag.
    pub fn find(&self, value: &TypedValue) -> Option<Arc<dyn Store>> {
        let kind = value.kind();
        if let Some(choice) = self
            .shared
            .choices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
        {
            return choice.map(|i| Arc::clone(&self.shared.stores[i]));
        }
        let choice = self
            .shared
            .stores
            .iter()
            .position(|store| store.can_store(value));
        trace!(kind = %kind, chosen = ?choice, "store scan");
        self.shared
            .choices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, choice);
        choice.map(|i| Arc::clone(&self.shared.stores[i]))
    }
}

impl Store for StoreRegistry {
    fn can_store(&self, value: &TypedValue) -> bool {
        self.find(value).is_some()
    }

    #[instrument(skip_all, fields(kind = %value.kind()), err)]
    fn store(&self, ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        let store = self.find(value).ok_or_else(|| ConvertError::NoStore {
            kind: value.kind().to_string(),
        })?;
        store.store(ctx, value)
    }
}

/// Paired load and store registries, the usual unit call sites work with.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    loaders: LoaderRegistry,
    stores: StoreRegistry,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        LoaderRegistry::new([])
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        StoreRegistry::new([])
    }
}

impl ConverterRegistry {
    pub fn new() -> ConverterRegistry {
        ConverterRegistry::default()
    }

    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    pub fn stores(&self) -> &StoreRegistry {
        &self.stores
    }

    /// New registry with `converter` appended to both directions.
    #[must_use]
    pub fn with_converter(&self, converter: Arc<dyn Converter>) -> ConverterRegistry {
        let load: Arc<dyn Load> = converter.clone();
        let store: Arc<dyn Store> = converter;
        ConverterRegistry {
            loaders: self.loaders.with_loader(load),
            stores: self.stores.with_store(store),
        }
    }

    /// New registry with a load-only converter appended.
    #[must_use]
    pub fn with_loader(&self, loader: Arc<dyn Load>) -> ConverterRegistry {
        ConverterRegistry {
            loaders: self.loaders.with_loader(loader),
            stores: self.stores.clone(),
        }
    }

    /// New registry with a store-only converter appended.
    #[must_use]
    pub fn with_store(&self, store: Arc<dyn Store>) -> ConverterRegistry {
        ConverterRegistry {
            loaders: self.loaders.clone(),
            stores: self.stores.with_store(store),
        }
    }
}

impl Load for ConverterRegistry {
    fn can_load(&self, shape: &Shape) -> bool {
        self.loaders.can_load(shape)
    }

    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        self.loaders.load(ctx, value, shape)
    }
}

impl Store for ConverterRegistry {
    fn can_store(&self, value: &TypedValue) -> bool {
        self.stores.can_store(value)
    }

    fn store(&self, ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        self.stores.store(ctx, value)
    }
}

/// One-shot gate: opens once, stays open forever, and releasing it wakes
/// all current and future waiters. Opening is idempotent and
/// irreversible.
#[derive(Clone)]
pub struct ReleaseGate {
    tx: Arc<watch::Sender<bool>>,
}

impl ReleaseGate {
    pub fn new() -> ReleaseGate {
        let (tx, _rx) = watch::channel(false);
        ReleaseGate { tx: Arc::new(tx) }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes once the gate is open; immediately if it already is.
    pub async fn opened(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so the channel cannot close under us.
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for ReleaseGate {
    fn default() -> Self {
        ReleaseGate::new()
    }
}

/// Registry decorator that blocks every load on a [`ReleaseGate`].
///
/// Intended for cases where the effective converter set is not final until
/// some asynchronous initialization elsewhere completes. While the gate is
/// closed, every load produces a deferred result that waits for the gate
/// and then delegates; once open, loads delegate synchronously. The store
/// direction has no deferred representation and delegates directly.
#[derive(Clone)]
pub struct GatedRegistry {
    inner: ConverterRegistry,
    gate: ReleaseGate,
}

impl GatedRegistry {
    pub fn new(inner: ConverterRegistry) -> GatedRegistry {
        GatedRegistry {
            inner,
            gate: ReleaseGate::new(),
        }
    }

    /// Handle to the gate, for the initialization side to open.
    pub fn gate(&self) -> ReleaseGate {
        self.gate.clone()
    }

    /// Opens the gate, releasing all blocked and future conversions.
    pub fn open(&self) {
        self.gate.open();
    }
}

impl Load for GatedRegistry {
    fn can_load(&self, shape: &Shape) -> bool {
        self.inner.can_load(shape)
    }

    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        if !ctx.is_bound() {
            ctx.submit_root(Arc::new(self.clone()));
        }
        if self.gate.is_open() {
            return self.inner.load(ctx, value, shape);
        }
        let gate = self.gate.clone();
        let inner = self.inner.clone();
        let mut branch = ctx.branch();
        let value = value.clone();
        let shape = shape.clone();
        Ok(TypedValue::deferred(async move {
            gate.opened().await;
            inner.load(&mut branch, &value, &shape)
        }))
    }
}

impl Store for GatedRegistry {
    fn can_store(&self, value: &TypedValue) -> bool {
        self.inner.can_store(value)
    }

    fn store(&self, ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        self.inner.store(ctx, value)
    }
}
