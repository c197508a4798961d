//! Lifecycle Engine service
//!
//! Reads an attester's current record from the store, feeds it with the
//! cycle's signals through `next_state`, and writes the verdict back through
//! the store's mutator. Never returns an error: anything the store refuses is
//! logged and reported in the outcome.

use crate::domain::{next_state, AlertKind, Decision, OnChainSignal, Signals};
use crate::ports::LifecycleAlertSink;
use af_01_state_store::{AttesterState, StateStore, StateUpdate};
use parking_lot::RwLock;
use shared_types::{Address, NetworkName};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Result of evaluating one attester.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluationOutcome {
    Unchanged(Option<AttesterState>),
    Transitioned {
        from: Option<AttesterState>,
        to: AttesterState,
    },
    Alerted {
        state: AttesterState,
        kind: AlertKind,
    },
    /// The store refused the proposed transition.
    Refused {
        from: AttesterState,
        to: AttesterState,
    },
}

/// Counts for one network-wide evaluation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub evaluated: usize,
    pub transitioned: usize,
    pub alerts: usize,
    pub refused: usize,
    /// Skipped because their next step depends on an unknown provider queue.
    pub deferred: usize,
}

/// Applies the transition rules to attesters held in the store.
pub struct LifecycleEngine {
    store: Arc<StateStore>,
    alert_sinks: RwLock<Vec<Arc<dyn LifecycleAlertSink>>>,
}

impl LifecycleEngine {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self {
            store,
            alert_sinks: RwLock::new(Vec::new()),
        }
    }

    pub fn add_alert_sink(&self, sink: Arc<dyn LifecycleAlertSink>) {
        self.alert_sinks.write().push(sink);
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Attesters the engine looks after on this network: known records, the
    /// applied roster and the given provider queue.
    pub fn tracked_attesters(&self, network: &NetworkName, queue: &[Address]) -> BTreeSet<Address> {
        let mut tracked: BTreeSet<Address> = self
            .store
            .attesters(network)
            .into_iter()
            .map(|record| record.address)
            .collect();
        if let Some(applied) = self.store.applied_config(network) {
            tracked.extend(applied.attesters.iter().map(|a| a.address));
        }
        tracked.extend(queue.iter().copied());
        tracked
    }

    /// Evaluate one attester against the current cycle's queue membership and
    /// the on-chain view last fetched into the store. Until a view has been
    /// fetched the on-chain signal is `Unknown`, which never raises an alert.
    pub fn evaluate_attester(
        &self,
        network: &NetworkName,
        address: &Address,
        in_provider_queue: bool,
    ) -> EvaluationOutcome {
        let record = self.store.attester(network, address);
        let current = record.as_ref().map(|r| r.state);
        // A view loaded from disk is not evidence until the rollup is asked again
        let on_chain = match &record {
            Some(_) if !self.store.view_observed(network, address) => OnChainSignal::Unknown,
            _ => OnChainSignal::classify(record.as_ref().and_then(|r| r.on_chain_view.as_ref())),
        };
        let signals = Signals::new(in_provider_queue, on_chain);

        match next_state(current, signals) {
            Decision::Stay => {
                debug!(
                    network = %network,
                    attester = %address,
                    state = current.map(|s| s.as_str()).unwrap_or("-"),
                    ?signals,
                    "[lifecycle] No transition"
                );
                EvaluationOutcome::Unchanged(current)
            }
            Decision::Move(to) => match self.store.update_attester_state(network, address, to) {
                StateUpdate::Applied { from, to } => EvaluationOutcome::Transitioned { from, to },
                StateUpdate::Unchanged => EvaluationOutcome::Unchanged(Some(to)),
                StateUpdate::Rejected { from, to } => {
                    warn!(
                        network = %network,
                        attester = %address,
                        from = %from,
                        to = %to,
                        "[lifecycle] Transition refused by store, ignoring"
                    );
                    EvaluationOutcome::Refused { from, to }
                }
            },
            Decision::Alert(kind) => {
                // Alert only arises for a known record.
                let state = current.unwrap_or(AttesterState::Active);
                error!(
                    alert = "critical",
                    network = %network,
                    attester = %address,
                    state = %state,
                    on_chain = ?on_chain,
                    kind = %kind,
                    "[lifecycle] Active attester is no longer validating on-chain; operator attention required"
                );
                for sink in self.alert_sinks.read().iter() {
                    sink.on_alert(network, address, state, kind);
                }
                EvaluationOutcome::Alerted { state, kind }
            }
        }
    }

    /// Evaluate every tracked attester of a network.
    ///
    /// `queue` is the provider queue observed this cycle.
    pub fn evaluate_network(&self, network: &NetworkName, queue: &[Address]) -> EvaluationSummary {
        self.evaluate_tracked(network, Some(queue))
    }

    /// Evaluate while the provider queue is unknown (configured provider, no
    /// snapshot). `IN_PROVIDER_QUEUE` attesters are left alone: leaving the
    /// queue cannot be told apart from the queue being unreadable.
    pub fn evaluate_network_without_queue(&self, network: &NetworkName) -> EvaluationSummary {
        self.evaluate_tracked(network, None)
    }

    fn evaluate_tracked(&self, network: &NetworkName, queue: Option<&[Address]>) -> EvaluationSummary {
        let queued: HashSet<&Address> = queue.unwrap_or_default().iter().collect();
        let mut summary = EvaluationSummary::default();

        for address in self.tracked_attesters(network, queue.unwrap_or_default()) {
            if queue.is_none()
                && self.store.attester(network, &address).map(|r| r.state)
                    == Some(AttesterState::InProviderQueue)
            {
                summary.deferred += 1;
                continue;
            }
            summary.evaluated += 1;
            match self.evaluate_attester(network, &address, queued.contains(&address)) {
                EvaluationOutcome::Transitioned { .. } => summary.transitioned += 1,
                EvaluationOutcome::Alerted { .. } => summary.alerts += 1,
                EvaluationOutcome::Refused { .. } => summary.refused += 1,
                EvaluationOutcome::Unchanged(_) => {}
            }
        }

        debug!(
            network = %network,
            evaluated = summary.evaluated,
            transitioned = summary.transitioned,
            alerts = summary.alerts,
            deferred = summary.deferred,
            "[lifecycle] Network evaluated"
        );
        summary
    }
}
