//! Dependency Cells
//!
//! A dependency cell is an opaque version counter. Reading it inside a
//! tracking context registers the running computation as a dependent;
//! bumping it increments the version and invalidates those dependents.
//!
//! Cells carry no value. The reactive object layer keeps one global cell and
//! one cell per property for every wrapped object, so "something about this
//! object changed" and "property `x` changed" can be observed separately.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::context::ReactiveContext;
use super::runtime::Runtime;

static CELL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_cell_id() -> u64 {
    CELL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A monotonic version counter that tracks its readers.
pub struct DependencyCell {
    id: u64,
    version: AtomicU64,
}

impl DependencyCell {
    /// Create a new cell at version 0.
    pub fn new() -> Self {
        Self {
            id: next_cell_id(),
            version: AtomicU64::new(0),
        }
    }

    /// Get the cell's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Read the version, registering the current computation as a dependent.
    pub fn read(&self) -> u64 {
        if let Some(subscriber_id) = ReactiveContext::current_subscriber() {
            ReactiveContext::track_dependency(self.id);
            Runtime::add_dependency(self.id, subscriber_id);
        }

        self.version.load(Ordering::Acquire)
    }

    /// Read the version without tracking.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Increment the version and invalidate every dependent.
    ///
    /// Returns the new version.
    pub fn bump(&self) -> u64 {
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(cell = self.id, version, "cell bumped");

        Runtime::notify_cell_change(self.id);
        version
    }
}

impl Default for DependencyCell {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DependencyCell {
    fn drop(&mut self) {
        Runtime::forget_cell(self.id);
    }
}

impl fmt::Debug for DependencyCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyCell")
            .field("id", &self.id)
            .field("version", &self.version())
            .finish()
    }
}
