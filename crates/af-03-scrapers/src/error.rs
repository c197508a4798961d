//! Error types for the chain-client port

use thiserror::Error;

/// Failures reported by a chain client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainClientError {
    /// Backend not reachable or not readable.
    #[error("Chain client unavailable: {0}")]
    Unavailable(String),

    /// The queried entity does not exist (e.g. unknown provider id).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend answered with something that does not decode.
    #[error("Malformed chain data: {0}")]
    Decode(String),
}

/// Result type for chain-client calls
pub type ChainResult<T> = Result<T, ChainClientError>;
