//! Outbound ports for the orchestrator

use shared_types::NetworkName;
use std::time::Duration;

/// Outcome of one scrape run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Success,
    Failure,
}

impl ScrapeOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeOutcome::Success => "success",
            ScrapeOutcome::Failure => "failure",
        }
    }
}

/// Notified after every scrape run (warm-up and scheduled).
pub trait ScrapeObserver: Send + Sync {
    fn on_scrape(
        &self,
        network: &NetworkName,
        scraper: &str,
        outcome: ScrapeOutcome,
        elapsed: Duration,
    );
}
