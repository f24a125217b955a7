//! Asynchronous coordination.

mod signal;

pub use signal::Signal;
