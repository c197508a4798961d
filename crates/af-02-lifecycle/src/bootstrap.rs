//! Network bootstrapping
//!
//! Runs once per network at startup, before any scraper:
//!
//! 1. Load persisted state (bad records skipped).
//! 2. Reconcile every roster entry: the more advanced of persisted state and
//!    roster hint wins, missing records are created.
//! 3. Record the roster as the network's applied configuration.

use crate::domain::reconcile;
use crate::error::{LifecycleError, LifecycleResult};
use af_01_state_store::{
    AppliedConfig, AttesterState, ConfiguredAttester, ReconcileOutcome, StateStore, StoreError,
};
use serde::Deserialize;
use shared_types::{now_millis, Address, NetworkName};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    attesters: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    address: String,
    #[serde(default)]
    coinbase: Option<String>,
    #[serde(default)]
    last_known_state: Option<String>,
}

/// Parse a roster document.
///
/// Entries with an unparseable address are skipped. An unparseable coinbase
/// or state hint is dropped, keeping the entry.
pub fn parse_roster(source: &str, raw: &str) -> LifecycleResult<Vec<ConfiguredAttester>> {
    let file: RosterFile =
        serde_json::from_str(raw).map_err(|e| LifecycleError::RosterFormat {
            path: source.to_string(),
            message: e.to_string(),
        })?;

    let mut roster = Vec::with_capacity(file.attesters.len());
    for entry in file.attesters {
        let address: Address = match entry.address.parse() {
            Ok(address) => address,
            Err(e) => {
                warn!(source, error = %e, "[lifecycle] Skipping roster entry");
                continue;
            }
        };
        let coinbase = entry.coinbase.and_then(|raw| match raw.parse::<Address>() {
            Ok(coinbase) => Some(coinbase),
            Err(e) => {
                warn!(source, attester = %address, error = %e, "[lifecycle] Ignoring invalid coinbase");
                None
            }
        });
        let last_known_state = entry
            .last_known_state
            .and_then(|raw| match raw.parse::<AttesterState>() {
                Ok(state) => Some(state),
                Err(e) => {
                    warn!(source, attester = %address, error = %e, "[lifecycle] Ignoring unknown state hint");
                    None
                }
            });
        roster.push(ConfiguredAttester {
            address,
            coinbase,
            last_known_state,
        });
    }
    Ok(roster)
}

/// Read a roster file. A missing file is an empty roster.
pub fn load_roster(path: &Path) -> LifecycleResult<Vec<ConfiguredAttester>> {
    let source = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(raw) => parse_roster(&source, &raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %source, "[lifecycle] No attester roster found, starting without one");
            Ok(Vec::new())
        }
        Err(e) => Err(LifecycleError::RosterIo {
            path: source,
            message: e.to_string(),
        }),
    }
}

/// Counts produced by one bootstrap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub created: usize,
    pub advanced: usize,
    pub unchanged: usize,
}

/// Prepares a network's state before scraping starts.
pub struct NetworkBootstrapper {
    store: Arc<StateStore>,
}

impl NetworkBootstrapper {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    pub fn bootstrap(
        &self,
        network: &NetworkName,
        roster: Vec<ConfiguredAttester>,
    ) -> LifecycleResult<ReconciliationReport> {
        self.store.get_or_create_network(network);
        match self.store.load_network(network) {
            Ok(_) | Err(StoreError::PersistenceDisabled) => {}
            Err(e) => return Err(e.into()),
        }

        let mut report = ReconciliationReport::default();
        for attester in &roster {
            let persisted = self
                .store
                .attester(network, &attester.address)
                .map(|record| record.state);
            let target = reconcile(persisted, attester.last_known_state);

            match self
                .store
                .reconcile_attester_state(network, &attester.address, target)
            {
                ReconcileOutcome::Created(_) => report.created += 1,
                ReconcileOutcome::Advanced { .. } => report.advanced += 1,
                ReconcileOutcome::Unchanged(_) => report.unchanged += 1,
            }
        }

        self.store.set_applied_config(
            network,
            AppliedConfig {
                attesters: roster,
                applied_at: now_millis(),
            },
        );

        info!(
            network = %network,
            created = report.created,
            advanced = report.advanced,
            unchanged = report.unchanged,
            "[lifecycle] Network bootstrapped"
        );
        Ok(report)
    }
}
