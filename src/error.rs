//! Error types for the storage contract
//!
//! Provides unified error handling using thiserror.
//!
//! Errors are reserved for infrastructural failures and contract misuse.
//! Expected cache outcomes (key absent, already exists, CAS mismatch,
//! nothing to remove) are communicated through return values, never through
//! this type.

use thiserror::Error;

// == Storage Error Enum ==
/// Unified error type for storage adapters.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend itself failed (e.g. the store lock was poisoned by a
    /// panicking writer). Aborts the current call; batch siblings already
    /// committed remain committed.
    #[error("Backend failure: {0}")]
    Backend(String),

    /// A value payload could not be serialized or deserialized.
    #[error("Serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation is not supported by this adapter, as declared by its
    /// capabilities descriptor.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The key failed validation (empty, too long, or pattern mismatch).
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },
}

impl StorageError {
    /// Shorthand for a [`StorageError::InvalidKey`] with an owned key.
    pub fn invalid_key(key: &str, reason: impl Into<String>) -> Self {
        StorageError::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
