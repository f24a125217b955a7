//! Trellis Core
//!
//! This crate provides the runtime underneath Trellis view models.
//! It implements:
//!
//! - Dependency cells and effects that re-run when the cells they read change
//! - Reactive objects: wrappers that track reads, bind methods and notify on
//!   writes, plus a base type owning the notification handler
//! - Observable sequences that report each mutation once to their owner
//! - An async signal that producers raise and consumers await
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: dependency cells, tracking context, runtime and effects
//! - `object`: models, values, wrappers, the reactive base and commands
//! - `collections`: the observable sequence
//! - `sync`: the signal / wait primitive
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use trellis_core::object::{wrap_model, Change, Model, ReactiveBase, Value};
//! use trellis_core::reactive::Effect;
//! use trellis_core::{Error, Result};
//!
//! struct Counter {
//!     base: ReactiveBase,
//!     count: parking_lot::Mutex<f64>,
//! }
//!
//! impl Model for Counter {
//!     fn get(&self, key: &str) -> Option<Value> {
//!         (key == "count").then(|| Value::from(*self.count.lock()))
//!     }
//!
//!     fn set(&self, key: &str, value: Value) -> Result<()> {
//!         match key {
//!             "count" => {
//!                 *self.count.lock() = ReactiveBase::to_number(&value);
//!                 Ok(())
//!             }
//!             other => Err(Error::unknown_property(other)),
//!         }
//!     }
//!
//!     fn keys(&self) -> Vec<String> {
//!         vec!["count".into()]
//!     }
//!
//!     fn reactive_base(&self) -> Option<&ReactiveBase> {
//!         Some(&self.base)
//!     }
//!
//!     fn as_any(&self) -> &dyn std::any::Any {
//!         self
//!     }
//! }
//!
//! let counter = wrap_model(Arc::new(Counter {
//!     base: ReactiveBase::with_handler(|change: &Change| println!("changed: {change:?}")),
//!     count: parking_lot::Mutex::new(0.0),
//! }));
//!
//! let runs = Arc::new(AtomicUsize::new(0));
//! let (c, r) = (counter.clone(), runs.clone());
//! let _effect = Effect::new(move || {
//!     c.get("count");
//!     r.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! counter.set("count", Value::from("5")).unwrap();
//! counter.set("count", Value::from(5)).unwrap();
//! assert_eq!(runs.load(Ordering::SeqCst), 2);
//! ```

pub mod collections;
pub mod error;
pub mod object;
pub mod reactive;
pub mod sync;

pub use collections::{ObservableVec, SequenceObserver};
pub use error::{Error, Result};
pub use object::{wrap, wrap_model, Change, Model, ReactiveBase, Value};
pub use sync::Signal;
