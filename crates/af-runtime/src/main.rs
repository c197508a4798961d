//! # Attester Fleet Monitor
//!
//! Entry point of the `af-node` binary.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`AF_CONFIG` file, then environment overrides)
//! 2. Initialise logging
//! 3. Bootstrap networks and start their scrapers
//! 4. Serve metrics until Ctrl+C, then shut down and flush

use af_runtime::{AfNode, RuntimeConfig};
use af_telemetry::{init_logging, TelemetryConfig};
use anyhow::{Context, Result};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("Failed to load configuration")?;

    let mut telemetry = TelemetryConfig::from_env();
    telemetry.metrics_port = config.metrics_port;
    if let Some(level) = &config.log_level {
        telemetry.log_level = level.clone();
    }
    init_logging(&telemetry).context("Failed to initialise logging")?;

    info!("===========================================");
    info!("  Attester Fleet Monitor v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!(
        networks = config.networks.len(),
        data_dir = %config.data_dir.display(),
        "Configuration loaded"
    );

    let mut node = AfNode::build(config).context("Failed to build node")?;
    node.start().await;
    let addr = node
        .serve_metrics()
        .await
        .context("Failed to start metrics server")?;
    info!(%addr, "Node is running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    node.shutdown().await;
    Ok(())
}
