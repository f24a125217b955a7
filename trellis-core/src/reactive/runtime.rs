//! Reactive Runtime
//!
//! The runtime connects dependency cells to the computations that read
//! them. It owns two process-wide tables:
//!
//! 1. a registry of live dependents (subscriber id -> weak reference), and
//! 2. the dependents of every cell (cell id -> ordered set of subscriber ids).
//!
//! When a cell is bumped the runtime looks up its dependents, upgrades the
//! ones that are still alive and invalidates them in registration order.
//!
//! # Thread Safety
//!
//! Both tables are `DashMap`s, so registration from several threads only
//! contends on a shard. No table lock is held while a dependent runs; a
//! dependent is free to read and bump cells from inside `invalidate`.

use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use indexmap::IndexSet;

use super::context::ReactiveContext;
use super::subscriber::SubscriberId;

/// A computation that must hear about changes to the cells it read.
pub trait Dependent: Send + Sync {
    /// Get the subscriber ID for this dependent.
    fn subscriber_id(&self) -> SubscriberId;

    /// A cell this dependent read has been bumped.
    fn invalidate(&self, cell_id: u64);
}

/// Handle to a registered dependent.
///
/// Dropping this handle unregisters the dependent from the runtime.
#[derive(Debug)]
pub struct DependentHandle {
    subscriber_id: SubscriberId,
}

impl DependentHandle {
    /// The subscriber this handle keeps registered.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }
}

impl Drop for DependentHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.subscriber_id);
    }
}

/// The global reactive runtime.
pub struct Runtime;

static REGISTRY: OnceLock<DashMap<SubscriberId, Weak<dyn Dependent>>> = OnceLock::new();
static CELL_DEPENDENTS: OnceLock<DashMap<u64, IndexSet<SubscriberId>>> = OnceLock::new();

fn registry() -> &'static DashMap<SubscriberId, Weak<dyn Dependent>> {
    REGISTRY.get_or_init(DashMap::new)
}

fn cell_dependents() -> &'static DashMap<u64, IndexSet<SubscriberId>> {
    CELL_DEPENDENTS.get_or_init(DashMap::new)
}

impl Runtime {
    /// Register a dependent with the runtime.
    ///
    /// Returns a handle that unregisters the dependent when dropped.
    pub fn register(dependent: Arc<dyn Dependent>) -> DependentHandle {
        let id = dependent.subscriber_id();
        registry().insert(id, Arc::downgrade(&dependent));
        tracing::trace!(subscriber = id.raw(), "registered dependent");

        DependentHandle { subscriber_id: id }
    }

    fn unregister(id: SubscriberId) {
        registry().remove(&id);

        for mut dependents in cell_dependents().iter_mut() {
            dependents.shift_remove(&id);
        }
        tracing::trace!(subscriber = id.raw(), "unregistered dependent");
    }

    /// Record that a subscriber depends on a cell.
    ///
    /// Called by [`DependencyCell::read`](super::DependencyCell::read) when a
    /// tracking context is active.
    pub fn add_dependency(cell_id: u64, subscriber_id: SubscriberId) {
        cell_dependents()
            .entry(cell_id)
            .or_default()
            .insert(subscriber_id);
    }

    /// Remove one dependency edge.
    pub fn remove_dependency(cell_id: u64, subscriber_id: SubscriberId) {
        if let Some(mut dependents) = cell_dependents().get_mut(&cell_id) {
            dependents.shift_remove(&subscriber_id);
        }
    }

    /// Drop every edge pointing at a cell. Called when the cell is dropped.
    pub fn forget_cell(cell_id: u64) {
        cell_dependents().remove(&cell_id);
    }

    /// Number of subscribers currently depending on a cell.
    pub fn dependent_count(cell_id: u64) -> usize {
        cell_dependents()
            .get(&cell_id)
            .map(|dependents| dependents.len())
            .unwrap_or(0)
    }

    /// Notify all dependents that a cell changed.
    ///
    /// This is the core update propagation mechanism.
    pub fn notify_cell_change(cell_id: u64) {
        let subscriber_ids: Vec<SubscriberId> = match cell_dependents().get(&cell_id) {
            Some(dependents) => dependents.iter().copied().collect(),
            None => return,
        };

        let live: Vec<Arc<dyn Dependent>> = subscriber_ids
            .into_iter()
            .filter_map(|id| registry().get(&id).and_then(|weak| weak.upgrade()))
            .collect();

        if live.is_empty() {
            return;
        }

        tracing::trace!(cell = cell_id, dependents = live.len(), "propagating cell change");
        for dependent in live {
            dependent.invalidate(cell_id);
        }
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }

    /// Check if we're inside a reactive context.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // Cell ids far above anything the cell allocator hands out in a test run.
    const CELL_A: u64 = u64::MAX - 1;
    const CELL_B: u64 = u64::MAX - 2;
    const CELL_C: u64 = u64::MAX - 3;

    struct MockDependent {
        id: SubscriberId,
        invalidated: Mutex<Vec<u64>>,
    }

    impl MockDependent {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: SubscriberId::new(),
                invalidated: Mutex::new(Vec::new()),
            })
        }
    }

    impl Dependent for MockDependent {
        fn subscriber_id(&self) -> SubscriberId {
            self.id
        }

        fn invalidate(&self, cell_id: u64) {
            self.invalidated.lock().push(cell_id);
        }
    }

    #[test]
    fn runtime_registers_and_unregisters() {
        let dependent = MockDependent::new();
        let id = dependent.id;

        let handle = Runtime::register(dependent);
        assert!(registry().contains_key(&id));

        drop(handle);
        assert!(!registry().contains_key(&id));
    }

    #[test]
    fn runtime_notifies_dependents() {
        let first = MockDependent::new();
        let second = MockDependent::new();

        let _first_handle = Runtime::register(first.clone());
        let _second_handle = Runtime::register(second.clone());

        Runtime::add_dependency(CELL_A, first.id);
        Runtime::add_dependency(CELL_A, second.id);
        Runtime::add_dependency(CELL_A, second.id);
        assert_eq!(Runtime::dependent_count(CELL_A), 2);

        Runtime::notify_cell_change(CELL_A);

        assert_eq!(*first.invalidated.lock(), vec![CELL_A]);
        assert_eq!(*second.invalidated.lock(), vec![CELL_A]);
    }

    #[test]
    fn dropped_dependents_are_skipped() {
        let dependent = MockDependent::new();
        let id = dependent.id;
        let handle = Runtime::register(dependent);

        Runtime::add_dependency(CELL_B, id);
        drop(handle);

        assert_eq!(Runtime::dependent_count(CELL_B), 0);
        Runtime::notify_cell_change(CELL_B);
    }

    #[test]
    fn runtime_removes_single_edges_and_cells() {
        let dependent = MockDependent::new();
        let _handle = Runtime::register(dependent.clone());

        Runtime::add_dependency(CELL_C, dependent.id);
        Runtime::remove_dependency(CELL_C, dependent.id);
        Runtime::notify_cell_change(CELL_C);
        assert!(dependent.invalidated.lock().is_empty());

        Runtime::add_dependency(CELL_C, dependent.id);
        Runtime::forget_cell(CELL_C);
        assert_eq!(Runtime::dependent_count(CELL_C), 0);
    }
}
