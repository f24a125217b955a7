//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a dependency cell is
//! read, the current computation is registered as one of its dependents.
//!
//! # Implementation
//!
//! A thread-local stack records the executing computations. Entering a
//! context (e.g. running an effect) pushes the subscriber; the returned guard
//! pops it again, so nested contexts work and the stack stays balanced even
//! if the computation panics.

use std::cell::RefCell;

use indexmap::IndexSet;

use super::SubscriberId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
#[derive(Debug, Clone)]
struct ContextEntry {
    /// The subscriber ID of the current computation.
    subscriber_id: SubscriberId,
    /// Cell ids read during this computation, first read first.
    dependencies: IndexSet<u64>,
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    subscriber_id: SubscriberId,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given subscriber.
    ///
    /// While this context is active, any cell that is read registers the
    /// subscriber as a dependent. The context is exited when the returned
    /// guard is dropped.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                subscriber_id,
                dependencies: IndexSet::new(),
            });
        });

        Self { subscriber_id }
    }

    /// Check if there is an active reactive context.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().map(|entry| entry.subscriber_id))
    }

    /// Record a dependency on the given cell.
    ///
    /// Repeated reads of one cell are recorded once.
    pub fn track_dependency(cell_id: u64) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                entry.dependencies.insert(cell_id);
            }
        });
    }

    /// Get the dependencies collected in the current context.
    pub fn get_dependencies() -> Vec<u64> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.iter().copied().collect())
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber_id, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry.subscriber_id
                );
            }
        });
    }
}
