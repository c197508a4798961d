//! Error types for the Lifecycle crate

use af_01_state_store::StoreError;
use thiserror::Error;

/// Lifecycle and bootstrap errors.
///
/// The transition engine itself never fails; these come from loading the
/// roster and persisted state at startup.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cannot read attester roster {path}: {message}")]
    RosterIo { path: String, message: String },

    #[error("Malformed attester roster {path}: {message}")]
    RosterFormat { path: String, message: String },
}

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
