//! Error types for the orchestrator

use shared_types::ScraperError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A scraper's `init` failed; the orchestrator must not start.
    #[error("Scraper setup failed: {0}")]
    Setup(ScraperError),

    #[error("Scraper {scraper}@{network} registered with a zero interval")]
    InvalidInterval { scraper: String, network: String },

    #[error("Orchestrator is {actual}, expected {expected}")]
    InvalidPhase {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
