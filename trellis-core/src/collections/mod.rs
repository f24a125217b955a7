//! Observable collections.
//!
//! Containers that route their mutations through an owning model's
//! notification path.

mod observable_vec;

pub use observable_vec::{ObservableVec, SequenceObserver};
