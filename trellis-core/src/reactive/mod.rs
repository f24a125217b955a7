//! Dependency Tracking
//!
//! This module implements the layer underneath reactive objects: version
//! cells that record who read them, and effects that re-run when a cell they
//! read changes.
//!
//! # Concepts
//!
//! ## Dependency Cells
//!
//! A [`DependencyCell`] is an opaque version counter. Reading it within a
//! tracking context registers that context as a dependent. Bumping it
//! increments the version and invalidates every dependent.
//!
//! ## Effects
//!
//! An [`Effect`] is a side-effecting computation that runs whenever one of
//! the cells it read is bumped. Effects are how application code reacts to
//! property changes on wrapped objects.
//!
//! # Implementation Notes
//!
//! A thread-local [`ReactiveContext`] stack tells a cell who is reading it;
//! the process-wide [`Runtime`] maps cells to their dependents.

mod cell;
mod context;
mod effect;
mod runtime;
mod subscriber;

pub use cell::DependencyCell;
pub use context::ReactiveContext;
pub use effect::Effect;
pub use runtime::{Dependent, DependentHandle, Runtime};
pub use subscriber::SubscriberId;
