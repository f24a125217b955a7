//! Reactive Base Type
//!
//! Models embed a [`ReactiveBase`] to get inline metadata and a
//! notification handler slot. `notify` always updates the dependency cells
//! before the handler runs, so a handler that re-reads properties sees fresh
//! dependency state.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::change::Change;
use super::metadata::ReactiveMetadata;
use super::value::{self, Value};

/// Application callback receiving every change raised on an object.
pub type NotifyHandler = Arc<dyn Fn(&Change) + Send + Sync>;

/// Anything that accepts change notifications.
pub trait Notify: Send + Sync {
    fn notify(&self, change: Change);
}

/// Cloneable handle to a base's notification state.
///
/// Sequences owned by a model hold one of these instead of a reference to
/// the model, so owner and sequence never form a cycle.
#[derive(Clone)]
pub struct Notifier {
    shared: Arc<Shared>,
}

struct Shared {
    metadata: Arc<ReactiveMetadata>,
    handler: RwLock<Option<NotifyHandler>>,
}

impl Notifier {
    fn dispatch(&self, change: Change) {
        if change.is_empty() {
            tracing::trace!("ignoring empty property list");
            return;
        }

        self.shared.metadata.invalidate(&change);

        // Cloned out so a handler may replace itself without deadlocking.
        let handler = self.shared.handler.read().clone();
        if let Some(handler) = handler {
            tracing::debug!(?change, "dispatching change to handler");
            handler(&change);
        }
    }

    pub fn metadata(&self) -> &Arc<ReactiveMetadata> {
        &self.shared.metadata
    }
}

impl Notify for Notifier {
    fn notify(&self, change: Change) {
        self.dispatch(change);
    }
}

/// Notification state embedded in reactive models.
pub struct ReactiveBase {
    notifier: Notifier,
}

impl ReactiveBase {
    pub fn new(handler: Option<NotifyHandler>) -> Self {
        Self {
            notifier: Notifier {
                shared: Arc::new(Shared {
                    metadata: Arc::new(ReactiveMetadata::new()),
                    handler: RwLock::new(handler),
                }),
            },
        }
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        Self::new(Some(Arc::new(handler)))
    }

    /// The inline metadata shared with this object's wrapper.
    pub fn metadata(&self) -> &Arc<ReactiveMetadata> {
        self.notifier.metadata()
    }

    /// Bump the cells named by `change`, then run the handler once.
    ///
    /// `None::<&str>` and [`Change::All`] request a full refresh. An empty
    /// property list does nothing.
    pub fn notify(&self, change: impl Into<Change>) {
        self.notifier.dispatch(change.into());
    }

    /// Replace the handler; `None` clears it.
    pub fn set_notify_handler(&self, handler: Option<NotifyHandler>) {
        *self.notifier.shared.handler.write() = handler;
    }

    pub fn notify_handler(&self) -> Option<NotifyHandler> {
        self.notifier.shared.handler.read().clone()
    }

    /// A handle that notifies through this base.
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    /// See [`value::to_number`].
    pub fn to_number(value: &Value) -> f64 {
        value::to_number(value)
    }
}

impl Default for ReactiveBase {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Notify for ReactiveBase {
    fn notify(&self, change: Change) {
        self.notifier.dispatch(change);
    }
}

impl fmt::Debug for ReactiveBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveBase")
            .field("metadata", self.metadata())
            .field("has_handler", &self.notifier.shared.handler.read().is_some())
            .finish()
    }
}
