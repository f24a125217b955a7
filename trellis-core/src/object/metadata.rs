//! Reactive bookkeeping attached to objects.
//!
//! Every wrapped object owns one [`ReactiveMetadata`]: a global cell that is
//! bumped on "refresh everything", lazily created per-property cells, the
//! bound-method cache and a weak link to its wrapper.
//!
//! # Association
//!
//! Models built on [`ReactiveBase`](super::ReactiveBase) carry their metadata
//! inline, so it lives and dies with the object and never shows up in
//! `keys()`. Any other model is tracked in a [`MetadataStore`]: a side table
//! keyed by allocation address that holds only a weak reference to the
//! object. The weak reference pins the allocation, so an address in the table
//! is never reused by another object while its slot exists; slots of dead
//! objects are swept once the table outgrows its threshold.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Deserialize;

use super::change::Change;
use super::method::Method;
use super::model::{object_address, Model};
use super::wrapper::Wrapper;
use crate::reactive::DependencyCell;

/// Per-object dependency cells, bound-method cache and wrapper slot.
pub struct ReactiveMetadata {
    global: DependencyCell,
    properties: DashMap<String, Arc<DependencyCell>>,
    bound: Mutex<HashMap<usize, BoundMethod>>,
    wrapper: Mutex<Weak<Wrapper>>,
}

struct BoundMethod {
    /// Held so the key address stays owned by this method.
    _original: Method,
    bound: Method,
}

impl ReactiveMetadata {
    pub fn new() -> Self {
        Self {
            global: DependencyCell::new(),
            properties: DashMap::new(),
            bound: Mutex::new(HashMap::new()),
            wrapper: Mutex::new(Weak::new()),
        }
    }

    /// The cell bumped when everything should refresh.
    pub fn global_cell(&self) -> &DependencyCell {
        &self.global
    }

    /// The cell for one property, created on first use.
    pub fn property_cell(&self, key: &str) -> Arc<DependencyCell> {
        if let Some(cell) = self.properties.get(key) {
            return cell.clone();
        }
        self.properties
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(DependencyCell::new()))
            .clone()
    }

    pub fn has_property_cell(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Untracked version of a property cell; `0` if it was never created.
    pub fn property_version(&self, key: &str) -> u64 {
        self.properties
            .get(key)
            .map(|cell| cell.version())
            .unwrap_or(0)
    }

    /// Untracked version of the global cell.
    pub fn global_version(&self) -> u64 {
        self.global.version()
    }

    /// Register a read of `key` with the active tracking context.
    pub fn touch(&self, key: &str) {
        self.global.read();
        self.property_cell(key).read();
    }

    /// Bump the cells named by `change`.
    pub fn invalidate(&self, change: &Change) {
        match change {
            Change::All => {
                self.global.bump();
            }
            _ => {
                for name in change.names() {
                    self.property_cell(name).bump();
                }
            }
        }
    }

    /// The memoized copy of `method` bound to `receiver`.
    pub fn bind(&self, method: &Method, receiver: &Arc<dyn Model>) -> Method {
        let mut bound = self.bound.lock();
        bound
            .entry(method.identity())
            .or_insert_with(|| {
                tracing::trace!(method = method.name(), "caching bound method");
                BoundMethod {
                    _original: method.clone(),
                    bound: method.bind(receiver),
                }
            })
            .bound
            .clone()
    }

    /// Number of distinct methods bound so far.
    pub fn bound_method_count(&self) -> usize {
        self.bound.lock().len()
    }

    /// The live wrapper for this object, if any.
    pub fn wrapper(&self) -> Option<Arc<Wrapper>> {
        self.wrapper.lock().upgrade()
    }

    /// Return the live wrapper or install the one built by `create`.
    pub(crate) fn wrapper_or_insert_with(
        &self,
        create: impl FnOnce() -> Arc<Wrapper>,
    ) -> Arc<Wrapper> {
        let mut slot = self.wrapper.lock();
        if let Some(existing) = slot.upgrade() {
            return existing;
        }
        let wrapper = create();
        *slot = Arc::downgrade(&wrapper);
        wrapper
    }
}

impl Default for ReactiveMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReactiveMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveMetadata")
            .field("global_version", &self.global_version())
            .field("properties", &self.properties.len())
            .field("bound_methods", &self.bound_method_count())
            .finish()
    }
}

/// Tuning for the side table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Table size that triggers the first sweep of dead slots. Later sweeps
    /// trigger at twice the live population, never below this value.
    pub sweep_threshold: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sweep_threshold: 64,
        }
    }
}

struct Slot {
    target: Weak<dyn Model>,
    metadata: Arc<ReactiveMetadata>,
}

/// Weak-keyed side table for models without inline metadata.
pub struct MetadataStore {
    slots: DashMap<usize, Slot>,
    config: StoreConfig,
    next_sweep: AtomicUsize,
}

static GLOBAL_STORE: OnceLock<MetadataStore> = OnceLock::new();

impl MetadataStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            slots: DashMap::new(),
            next_sweep: AtomicUsize::new(config.sweep_threshold),
            config,
        }
    }

    /// The process-wide store used by [`wrap`](super::wrap).
    pub fn global() -> &'static MetadataStore {
        GLOBAL_STORE.get_or_init(|| MetadataStore::new(StoreConfig::default()))
    }

    /// Existing metadata for `target`, or a freshly associated one.
    pub fn ensure(&self, target: &Arc<dyn Model>) -> Arc<ReactiveMetadata> {
        if let Some(base) = target.reactive_base() {
            return base.metadata().clone();
        }

        let metadata = self
            .slots
            .entry(object_address(target))
            .or_insert_with(|| Slot {
                target: Arc::downgrade(target),
                metadata: Arc::new(ReactiveMetadata::new()),
            })
            .metadata
            .clone();

        self.maybe_sweep();
        metadata
    }

    /// Existing metadata for `target`, without creating any.
    pub fn get(&self, target: &Arc<dyn Model>) -> Option<Arc<ReactiveMetadata>> {
        if let Some(base) = target.reactive_base() {
            return Some(base.metadata().clone());
        }
        self.slots
            .get(&object_address(target))
            .map(|slot| slot.metadata.clone())
    }

    /// Number of side-table slots, live or dead.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove the slots of dropped objects. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.target.strong_count() > 0);
        before.saturating_sub(self.slots.len())
    }

    fn maybe_sweep(&self) {
        if self.slots.len() < self.next_sweep.load(Ordering::Relaxed) {
            return;
        }

        let removed = self.prune();
        let live = self.slots.len();
        self.next_sweep
            .store((live * 2).max(self.config.sweep_threshold), Ordering::Relaxed);
        tracing::debug!(removed, live, "swept metadata store");
    }
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
