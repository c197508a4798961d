//! Runtime error types

use crate::config::ConfigError;
use af_02_lifecycle::LifecycleError;
use af_04_orchestrator::OrchestratorError;
use af_telemetry::TelemetryError;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[from] LifecycleError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error("Metrics server error: {0}")]
    Server(#[from] std::io::Error),
}
