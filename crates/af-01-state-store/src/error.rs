//! Error types for the State Store

use thiserror::Error;

/// Persistence backend errors.
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    /// Filesystem read or write failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// File exists but is not valid structured text.
    #[error("Corrupt state file {path}: {message}")]
    Corrupt { path: String, message: String },

    /// Serialisation of in-memory state failed.
    #[error("Failed to encode state: {0}")]
    Encode(String),
}

/// State Store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// No persistence backend configured for a load request.
    #[error("No persistence backend configured")]
    PersistenceDisabled,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
