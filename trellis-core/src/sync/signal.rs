//! Signal / Wait Primitive
//!
//! A [`Signal`] is a named, resettable gate. Callers wait on the current
//! gate; a producer raises it, releasing every waiter at once.
//!
//! # States
//!
//! - **armed**: the current gate has not been raised. Waiters park.
//! - **raised**: the current gate has been raised. An auto-reset signal
//!   immediately installs a fresh armed gate; a manual-reset signal stays
//!   raised, so later waiters resolve at once, until [`Signal::reset`].
//!
//! Each gate is a `tokio::sync::watch` channel. [`Signal::wait`] subscribes
//! to the gate that is current *when it is called*, so a waiter created
//! after a raise on an auto-reset signal waits for the next raise.
//!
//! A gate replaced by `reset` before it was raised is abandoned: its waiters
//! resolve with [`Error::WaitAbandoned`] rather than hanging.

use std::fmt;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{Error, Result};

/// A named async gate with auto- or manual-reset behaviour.
pub struct Signal {
    name: String,
    auto_reset: bool,
    gate: Mutex<watch::Sender<bool>>,
}

fn armed_gate() -> watch::Sender<bool> {
    watch::channel(false).0
}

impl Signal {
    /// Create an armed signal. The name is stored lower-cased.
    pub fn new(name: &str, auto_reset: bool) -> Self {
        Self {
            name: name.to_lowercase(),
            auto_reset,
            gate: Mutex::new(armed_gate()),
        }
    }

    /// An auto-reset signal.
    pub fn auto(name: &str) -> Self {
        Self::new(name, true)
    }

    /// A manual-reset signal.
    pub fn manual(name: &str) -> Self {
        Self::new(name, false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn auto_reset(&self) -> bool {
        self.auto_reset
    }

    /// Whether the current gate is raised. Always `false` for an
    /// auto-reset signal outside of `set`.
    pub fn is_set(&self) -> bool {
        *self.gate.lock().borrow()
    }

    /// Wait for the current gate to be raised.
    ///
    /// The gate is captured now; the returned future owns everything it
    /// needs and does not borrow the signal.
    pub fn wait(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        let mut gate = self.gate.lock().subscribe();
        let name = self.name.clone();

        async move {
            let outcome = gate.wait_for(|raised| *raised).await.map(|_| ());
            outcome.map_err(|_| {
                tracing::warn!(signal = %name, "wait abandoned by reset");
                Error::WaitAbandoned { signal: name }
            })
        }
    }

    /// Raise the current gate, then re-arm if this is an auto-reset signal.
    ///
    /// Raising an already raised gate does nothing.
    pub fn set(&self) {
        let mut gate = self.gate.lock();
        let raised = gate.send_if_modified(|raised| !std::mem::replace(raised, true));
        if raised {
            tracing::debug!(signal = %self.name, waiters = gate.receiver_count(), "signal raised");
        }

        if self.auto_reset {
            *gate = armed_gate();
        }
    }

    /// Install a fresh armed gate, abandoning the current one.
    pub fn reset(&self) {
        let previous = std::mem::replace(&mut *self.gate.lock(), armed_gate());
        tracing::debug!(
            signal = %self.name,
            abandoned = !*previous.borrow() && previous.receiver_count() > 0,
            "signal reset"
        );
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("auto_reset", &self.auto_reset)
            .field("is_set", &self.is_set())
            .finish()
    }
}
