//! # Attester Fleet Telemetry
//!
//! Logging and Prometheus metrics for the attester fleet monitor.
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | `init_logging` | Installs the `tracing` subscriber (pretty or JSON) |
//! | `MetricsFacade` | Renders store contents as gauges, on demand |
//! | `MetricsRecorder` | Counts transitions, alerts and scrape runs as they happen |
//!
//! ## Usage
//!
//! ```ignore
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//!
//! let recorder = Arc::new(MetricsRecorder::new()?);
//! store.add_listener(recorder.clone());
//!
//! // GET /metrics
//! let body = MetricsFacade::render(&store)?;
//! ```

pub mod config;
pub mod facade;
pub mod metrics;
pub mod recorder;
pub mod tracing_setup;

pub use config::TelemetryConfig;
pub use facade::MetricsFacade;
pub use metrics::{encode_metrics, register_metrics};
pub use recorder::MetricsRecorder;
pub use tracing_setup::init_logging;

use thiserror::Error;

/// Telemetry errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
