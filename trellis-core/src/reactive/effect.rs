//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever a
//! dependency cell it read is bumped.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. The function runs inside a [`ReactiveContext`], so every cell it reads
//!    (directly, or through a wrapped object) registers the effect with the
//!    [`Runtime`].
//!
//! 3. When any of those cells is bumped, the runtime invalidates the effect,
//!    which drops its old dependencies and runs again to collect new ones.
//!
//! A bump that happens while the effect is already running on the same
//! thread (the effect writing a property it also reads) does not recurse.
//! A bump from another thread during a run marks the effect dirty, and the
//! running thread runs it again once the current run finishes.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use indexmap::IndexSet;
use parking_lot::Mutex;

use super::context::ReactiveContext;
use super::runtime::{Dependent, DependentHandle, Runtime};
use super::subscriber::SubscriberId;

static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_effect_id() -> u64 {
    EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A side-effecting computation that re-runs when its dependencies change.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use trellis_core::reactive::{DependencyCell, Effect};
///
/// let cell = Arc::new(DependencyCell::new());
/// let seen = Arc::new(AtomicU64::new(0));
///
/// let (c, s) = (cell.clone(), seen.clone());
/// let _effect = Effect::new(move || s.store(c.read(), Ordering::SeqCst));
///
/// cell.bump();
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
    _handle: Arc<DependentHandle>,
}

struct EffectInner {
    id: u64,
    subscriber_id: SubscriberId,
    run: Box<dyn Fn() + Send + Sync>,
    /// Cell ids read during the last run.
    dependencies: Mutex<IndexSet<u64>>,
    disposed: AtomicBool,
    running: AtomicBool,
    /// Thread currently running the effect.
    runner: Mutex<Option<ThreadId>>,
    /// Set when another thread invalidated the effect mid-run.
    dirty: AtomicBool,
    run_count: AtomicUsize,
}

/// Clears the running state even if the effect body panics.
struct RunningGuard<'a>(&'a EffectInner);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.0.runner.lock() = None;
        self.0.running.store(false, Ordering::SeqCst);
    }
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::new_lazy(run);
        effect.execute();
        effect
    }

    /// Create a new effect without running it immediately.
    ///
    /// The effect has no dependencies until [`execute`](Self::execute) runs.
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let inner = Arc::new(EffectInner {
            id: next_effect_id(),
            subscriber_id: SubscriberId::new(),
            run: Box::new(run),
            dependencies: Mutex::new(IndexSet::new()),
            disposed: AtomicBool::new(false),
            running: AtomicBool::new(false),
            runner: Mutex::new(None),
            dirty: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
        });
        let handle = Runtime::register(inner.clone());

        Self {
            inner,
            _handle: Arc::new(handle),
        }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the subscriber ID for this effect.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Execute the effect function, re-collecting its dependencies.
    pub fn execute(&self) {
        self.inner.execute();
    }

    /// Dispose of the effect.
    ///
    /// After disposal, the effect will not run again and holds no edges.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.inner.release_dependencies();
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Get the number of cells read during the last run.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.lock().len()
    }
}

impl EffectInner {
    fn execute(&self) {
        loop {
            if self.disposed.load(Ordering::SeqCst) {
                return;
            }

            if self
                .running
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                if *self.runner.lock() == Some(thread::current().id()) {
                    tracing::trace!(effect = self.id, "skipping re-entrant run");
                    return;
                }
                self.dirty.store(true, Ordering::SeqCst);
                // The runner checks `dirty` after it stops running; if it
                // already stopped, take over.
                if self.running.load(Ordering::SeqCst) {
                    tracing::trace!(effect = self.id, "marked dirty during a run");
                    return;
                }
                continue;
            }

            {
                let _running = RunningGuard(self);
                *self.runner.lock() = Some(thread::current().id());
                self.dirty.store(false, Ordering::SeqCst);
                self.run_once();
            }

            if !self.dirty.swap(false, Ordering::SeqCst) {
                return;
            }
        }
    }

    fn run_once(&self) {
        self.release_dependencies();

        let collected = {
            let _ctx = ReactiveContext::enter(self.subscriber_id);
            (self.run)();
            ReactiveContext::get_dependencies()
        };

        *self.dependencies.lock() = collected.into_iter().collect();
        self.run_count.fetch_add(1, Ordering::SeqCst);
    }

    fn release_dependencies(&self) {
        let previous = std::mem::take(&mut *self.dependencies.lock());
        for cell_id in previous {
            Runtime::remove_dependency(cell_id, self.subscriber_id);
        }
    }
}

impl Dependent for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn invalidate(&self, cell_id: u64) {
        tracing::trace!(effect = self.id, cell = cell_id, "effect invalidated");
        self.execute();
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
