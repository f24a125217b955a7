//! Reactive Objects
//!
//! This module turns plain property bags into reactive objects.
//!
//! # Concepts
//!
//! ## Models
//!
//! A [`Model`] exposes string-keyed properties through `get`, `set` and
//! `keys`, with values carried as [`Value`]s. Methods are properties whose
//! value is a [`Method`].
//!
//! ## Wrappers
//!
//! [`wrap`] produces a [`Wrapper`] that records reads as dependencies on the
//! object's [`ReactiveMetadata`], binds methods to the target and notifies
//! on writes that change a value.
//!
//! ## Reactive Base
//!
//! Models embed a [`ReactiveBase`] to own their metadata and a notification
//! handler. [`ReactiveBase::notify`] bumps cells, then calls the handler with
//! a [`Change`].
//!
//! ## Commands
//!
//! `dyn Model` gains [`do_command`](command::do_command), which dispatches a
//! [`Command`] to a method by name or to [`Model::on_command`].

mod base;
mod change;
mod command;
mod metadata;
mod method;
mod model;
mod value;
mod wrapper;

pub use base::{Notifier, Notify, NotifyHandler, ReactiveBase};
pub use change::Change;
pub use command::{do_command, Command, DO_COMMAND};
pub use metadata::{MetadataStore, ReactiveMetadata, StoreConfig};
pub use method::Method;
pub use model::{
    is_trackable, same_object, snapshot, Model, CONSTRUCTOR_KEY, IS_WRAPPER_KEY, RESERVED_PREFIX,
    TARGET_KEY,
};
pub use value::{to_number, Value};
pub use wrapper::{is_wrapper, unwrap, unwrap_model, wrap, wrap_in, wrap_model, Wrapper};
