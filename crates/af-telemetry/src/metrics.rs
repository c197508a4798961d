//! Prometheus metrics for the attester fleet monitor.
//!
//! All metrics follow the naming convention: `af_<concern>_<metric>[_<unit>]`
//!
//! ## Metric Types
//!
//! - **Gauge**: point-in-time store contents, refreshed on every render
//! - **Counter**: events counted as they happen (transitions, alerts, scrape runs)

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ATTESTER LIFECYCLE
    // =========================================================================

    /// Attesters per lifecycle state
    pub static ref ATTESTERS: GaugeVec = GaugeVec::new(
        Opts::new("af_attesters", "Number of tracked attesters by lifecycle state"),
        &["network", "state"]
    ).expect("metric creation failed");

    /// Accepted lifecycle transitions
    pub static ref LIFECYCLE_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("af_lifecycle_transitions_total", "Accepted attester lifecycle transitions"),
        &["network", "from", "to"]  // from: "NONE" for newly created records
    ).expect("metric creation failed");

    /// Critical operator alerts
    pub static ref LIFECYCLE_ALERTS: CounterVec = CounterVec::new(
        Opts::new("af_lifecycle_alerts_total", "Critical lifecycle anomalies raised for operators"),
        &["network", "kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // STAKING PROVIDER
    // =========================================================================

    pub static ref PROVIDER_QUEUE_LENGTH: GaugeVec = GaugeVec::new(
        Opts::new("af_provider_queue_length", "Attesters waiting in the staking provider queue"),
        &["network"]
    ).expect("metric creation failed");

    pub static ref PROVIDER_SNAPSHOT_TIMESTAMP: GaugeVec = GaugeVec::new(
        Opts::new("af_provider_snapshot_timestamp_ms", "When the provider snapshot was observed"),
        &["network"]
    ).expect("metric creation failed");

    // =========================================================================
    // PUBLISHERS
    // =========================================================================

    pub static ref PUBLISHER_BALANCE: GaugeVec = GaugeVec::new(
        Opts::new("af_publisher_balance", "Current publisher balance"),
        &["network", "publisher"]
    ).expect("metric creation failed");

    pub static ref PUBLISHER_REQUIRED_TOP_UP: GaugeVec = GaugeVec::new(
        Opts::new("af_publisher_required_top_up", "Amount needed to reach the minimum publisher balance"),
        &["network", "publisher"]
    ).expect("metric creation failed");

    pub static ref PUBLISHER_OBSERVED_TIMESTAMP: GaugeVec = GaugeVec::new(
        Opts::new("af_publisher_observed_timestamp_ms", "When the publisher balance was observed"),
        &["network", "publisher"]
    ).expect("metric creation failed");

    // =========================================================================
    // REWARDS (latest snapshot per coinbase)
    // =========================================================================

    pub static ref REWARDS_PENDING: GaugeVec = GaugeVec::new(
        Opts::new("af_rewards_pending", "Unclaimed rewards of a coinbase"),
        &["network", "coinbase"]
    ).expect("metric creation failed");

    pub static ref REWARDS_OUR_SHARE: GaugeVec = GaugeVec::new(
        Opts::new("af_rewards_our_share", "Provider share of the pending rewards"),
        &["network", "coinbase"]
    ).expect("metric creation failed");

    pub static ref REWARDS_OTHER_SHARE: GaugeVec = GaugeVec::new(
        Opts::new("af_rewards_other_share", "Non-provider share of the pending rewards"),
        &["network", "coinbase"]
    ).expect("metric creation failed");

    pub static ref REWARDS_SNAPSHOT_TIMESTAMP: GaugeVec = GaugeVec::new(
        Opts::new("af_rewards_snapshot_timestamp_ms", "When the latest rewards snapshot was taken"),
        &["network", "coinbase"]
    ).expect("metric creation failed");

    // =========================================================================
    // SCRAPERS
    // =========================================================================

    pub static ref SCRAPE_RUNS: CounterVec = CounterVec::new(
        Opts::new("af_scrape_runs_total", "Scraper runs by outcome"),
        &["network", "scraper", "outcome"]  // outcome: success/failure
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Lifecycle
        Box::new(ATTESTERS.clone()),
        Box::new(LIFECYCLE_TRANSITIONS.clone()),
        Box::new(LIFECYCLE_ALERTS.clone()),
        // Provider
        Box::new(PROVIDER_QUEUE_LENGTH.clone()),
        Box::new(PROVIDER_SNAPSHOT_TIMESTAMP.clone()),
        // Publishers
        Box::new(PUBLISHER_BALANCE.clone()),
        Box::new(PUBLISHER_REQUIRED_TOP_UP.clone()),
        Box::new(PUBLISHER_OBSERVED_TIMESTAMP.clone()),
        // Rewards
        Box::new(REWARDS_PENDING.clone()),
        Box::new(REWARDS_OUR_SHARE.clone()),
        Box::new(REWARDS_OTHER_SHARE.clone()),
        Box::new(REWARDS_SNAPSHOT_TIMESTAMP.clone()),
        // Scrapers
        Box::new(SCRAPE_RUNS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
