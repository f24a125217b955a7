//! Error Types
//!
//! Every fallible operation in the crate returns [`Result`]. Write
//! rejections come from models and are passed through the wrapper unchanged,
//! so callers see exactly what the underlying model reported.

use thiserror::Error;

/// Errors produced by the runtime and by models driven through it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The model refused a write because the property is computed or read-only.
    #[error("property `{property}` is read-only")]
    ReadOnly { property: String },

    /// The model has no property with this name.
    #[error("unknown property `{property}`")]
    UnknownProperty { property: String },

    /// The written value has the wrong shape for the property.
    #[error("property `{property}` expects {expected}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
    },

    /// A sequence index was past the end.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A bound method outlived the object it was bound to.
    #[error("receiver of bound method `{method}` has been dropped")]
    ReceiverDropped { method: String },

    /// An unbound method was called without a receiver.
    #[error("method `{method}` is not bound to a receiver")]
    Unbound { method: String },

    /// A typed method was invoked with a receiver of another type.
    #[error("method `{method}` expects a receiver of type {expected}")]
    ReceiverMismatch {
        method: String,
        expected: &'static str,
    },

    /// The gate a waiter was parked on was replaced before it was raised.
    #[error("wait on signal `{signal}` was abandoned by a reset")]
    WaitAbandoned { signal: String },
}

impl Error {
    /// Shorthand for [`Error::ReadOnly`].
    pub fn read_only(property: impl Into<String>) -> Self {
        Self::ReadOnly {
            property: property.into(),
        }
    }

    /// Shorthand for [`Error::UnknownProperty`].
    pub fn unknown_property(property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            property: property.into(),
        }
    }

    /// Shorthand for [`Error::TypeMismatch`].
    pub fn type_mismatch(property: impl Into<String>, expected: &'static str) -> Self {
        Self::TypeMismatch {
            property: property.into(),
            expected,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
