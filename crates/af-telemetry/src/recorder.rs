//! Event counters fed by the store, the lifecycle engine and the orchestrator.

use af_01_state_store::{AttesterState, AttesterStateListener};
use af_02_lifecycle::{AlertKind, LifecycleAlertSink};
use af_04_orchestrator::{ScrapeObserver, ScrapeOutcome};
use shared_types::{Address, NetworkName};
use std::time::Duration;

use crate::metrics::{register_metrics, LIFECYCLE_ALERTS, LIFECYCLE_TRANSITIONS, SCRAPE_RUNS};
use crate::TelemetryError;

/// Label used for `from` when a record is created.
const NO_STATE: &str = "NONE";

/// Counts transitions, alerts and scrape runs into the global registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Registers the metrics before handing out the recorder.
    pub fn new() -> Result<Self, TelemetryError> {
        register_metrics()?;
        Ok(Self)
    }
}

impl AttesterStateListener for MetricsRecorder {
    fn on_state_changed(
        &self,
        network: &NetworkName,
        _address: &Address,
        from: Option<AttesterState>,
        to: AttesterState,
    ) {
        let from = from.map(AttesterState::as_str).unwrap_or(NO_STATE);
        LIFECYCLE_TRANSITIONS
            .with_label_values(&[network.as_str(), from, to.as_str()])
            .inc();
    }
}

impl LifecycleAlertSink for MetricsRecorder {
    fn on_alert(
        &self,
        network: &NetworkName,
        _address: &Address,
        _state: AttesterState,
        kind: AlertKind,
    ) {
        LIFECYCLE_ALERTS
            .with_label_values(&[network.as_str(), kind.as_str()])
            .inc();
    }
}

impl ScrapeObserver for MetricsRecorder {
    fn on_scrape(
        &self,
        network: &NetworkName,
        scraper: &str,
        outcome: ScrapeOutcome,
        _elapsed: Duration,
    ) {
        SCRAPE_RUNS
            .with_label_values(&[network.as_str(), scraper, outcome.as_str()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_counted_with_none_origin() {
        let recorder = MetricsRecorder::new().unwrap();
        let network = NetworkName::new("recorder-transitions");
        let address = Address([1; 20]);

        recorder.on_state_changed(&network, &address, None, AttesterState::New);
        recorder.on_state_changed(
            &network,
            &address,
            Some(AttesterState::New),
            AttesterState::InProviderQueue,
        );

        let created = LIFECYCLE_TRANSITIONS
            .with_label_values(&["recorder-transitions", "NONE", "NEW"])
            .get();
        let queued = LIFECYCLE_TRANSITIONS
            .with_label_values(&["recorder-transitions", "NEW", "IN_PROVIDER_QUEUE"])
            .get();
        assert_eq!(created, 1.0);
        assert_eq!(queued, 1.0);
    }

    #[test]
    fn test_alerts_and_scrapes_counted() {
        let recorder = MetricsRecorder::new().unwrap();
        let network = NetworkName::new("recorder-events");

        recorder.on_alert(
            &network,
            &Address([2; 20]),
            AttesterState::Active,
            AlertKind::ActiveNotValidating,
        );
        recorder.on_scrape(&network, "rewards", ScrapeOutcome::Failure, Duration::ZERO);
        recorder.on_scrape(&network, "rewards", ScrapeOutcome::Failure, Duration::ZERO);

        assert_eq!(
            LIFECYCLE_ALERTS
                .with_label_values(&["recorder-events", "active_not_validating"])
                .get(),
            1.0
        );
        assert_eq!(
            SCRAPE_RUNS
                .with_label_values(&["recorder-events", "rewards", "failure"])
                .get(),
            2.0
        );
    }
}
