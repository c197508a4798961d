//! # State Store
//!
//! Owns every per-network table and is the only place they are mutated.
//!
//! ## Concurrency
//!
//! Tables sit behind one `RwLock`. Every mutator takes the write guard, applies
//! its change synchronously and releases it before notifying listeners or
//! touching the flusher, so no guard is ever held across an `.await`. Readers
//! receive owned snapshots; there is no way to reach the live tables from
//! outside this module.
//!
//! ## Persistence
//!
//! Each network owns a `DebouncedFlusher`. Lifecycle changes, on-chain view
//! changes and new rewards snapshots schedule a flush; `shutdown()` writes any
//! open window synchronously.

use crate::domain::{
    AppliedConfig, AttesterOnChainView, AttesterRecord, AttesterState, NetworkState,
    PublisherBalance, RewardsSnapshot, StakingProviderSnapshot,
};
use crate::error::{StoreError, StoreResult};
use crate::flusher::DebouncedFlusher;
use crate::ports::{AttesterStateListener, StatePersistence};
use parking_lot::{Mutex, RwLock};
use shared_types::{now_millis, Address, NetworkName};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default debounce window for disk writes.
pub const DEFAULT_FLUSH_DEBOUNCE: Duration = Duration::from_secs(5);

/// Store configuration
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Minimum spacing between two writes of one network's files.
    pub flush_debounce: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            flush_debounce: DEFAULT_FLUSH_DEBOUNCE,
        }
    }
}

/// Outcome of `update_attester_state`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateUpdate {
    /// State changed; listeners notified, flush scheduled.
    Applied {
        from: Option<AttesterState>,
        to: AttesterState,
    },
    /// Requested state equals the current one. Nothing happened.
    Unchanged,
    /// Transition refused by store validation.
    Rejected {
        from: AttesterState,
        to: AttesterState,
    },
}

/// Outcome of `reconcile_attester_state`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created(AttesterState),
    Advanced {
        from: AttesterState,
        to: AttesterState,
    },
    Unchanged(AttesterState),
}

/// Summary of a network load from persistence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub attesters: usize,
    pub rewards: usize,
    pub skipped: usize,
}

struct StoreInner {
    config: StoreConfig,
    networks: RwLock<BTreeMap<NetworkName, NetworkState>>,
    flushers: Mutex<HashMap<NetworkName, Arc<DebouncedFlusher>>>,
    listeners: RwLock<Vec<Arc<dyn AttesterStateListener>>>,
    persistence: Option<Arc<dyn StatePersistence>>,
    /// One writer at a time per network: an elapsed window and `flush_now`
    /// may race otherwise.
    write_locks: Mutex<HashMap<NetworkName, Arc<Mutex<()>>>>,
}

impl StoreInner {
    /// Write the persisted table groups of one network.
    fn persist_network(&self, network: &NetworkName) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let write_lock = Arc::clone(self.write_locks.lock().entry(network.clone()).or_default());
        let _writing = write_lock.lock();

        let (records, rewards) = {
            let networks = self.networks.read();
            let Some(state) = networks.get(network) else {
                return;
            };
            (
                state.attester_lifecycle.values().cloned().collect::<Vec<_>>(),
                state.rewards_history.clone(),
            )
        };

        if let Err(e) = persistence.save_attesters(network, &records) {
            error!(network = %network, error = %e, "[store] Failed to persist attester lifecycle");
        }
        if let Err(e) = persistence.save_rewards(network, &rewards) {
            error!(network = %network, error = %e, "[store] Failed to persist rewards history");
        }
        debug!(
            network = %network,
            attesters = records.len(),
            rewards = rewards.len(),
            "[store] State flushed"
        );
    }
}

/// In-memory state for every configured network, with debounced write-back.
///
/// Constructed once at process start and shared as `Arc<StateStore>`.
pub struct StateStore {
    inner: Arc<StoreInner>,
}

impl StateStore {
    pub fn new(config: StoreConfig, persistence: Option<Arc<dyn StatePersistence>>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config,
                networks: RwLock::new(BTreeMap::new()),
                flushers: Mutex::new(HashMap::new()),
                listeners: RwLock::new(Vec::new()),
                persistence,
                write_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Store without persistence.
    pub fn in_memory() -> Self {
        Self::new(StoreConfig::default(), None)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn add_listener(&self, listener: Arc<dyn AttesterStateListener>) {
        self.inner.listeners.write().push(listener);
    }

    // =========================================================================
    // READ ACCESSORS (owned snapshots)
    // =========================================================================

    /// Snapshot of a network's state, creating the empty state on first use.
    pub fn get_or_create_network(&self, network: &NetworkName) -> NetworkState {
        if let Some(state) = self.inner.networks.read().get(network) {
            return state.clone();
        }
        self.inner
            .networks
            .write()
            .entry(network.clone())
            .or_insert_with(|| {
                info!(network = %network, "[store] Network state initialised");
                NetworkState::default()
            })
            .clone()
    }

    pub fn networks(&self) -> Vec<NetworkName> {
        self.inner.networks.read().keys().cloned().collect()
    }

    pub fn network_state(&self, network: &NetworkName) -> Option<NetworkState> {
        self.inner.networks.read().get(network).cloned()
    }

    pub fn attester(&self, network: &NetworkName, address: &Address) -> Option<AttesterRecord> {
        self.inner
            .networks
            .read()
            .get(network)
            .and_then(|state| state.attester_lifecycle.get(address).cloned())
    }

    /// Whether the attester's on-chain view has been fetched since startup.
    /// A persisted view alone does not count.
    pub fn view_observed(&self, network: &NetworkName, address: &Address) -> bool {
        self.inner
            .networks
            .read()
            .get(network)
            .map(|state| state.views_observed.contains(address))
            .unwrap_or(false)
    }

    pub fn attesters(&self, network: &NetworkName) -> Vec<AttesterRecord> {
        self.inner
            .networks
            .read()
            .get(network)
            .map(|state| state.attester_lifecycle.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn attester_counts(&self, network: &NetworkName) -> BTreeMap<AttesterState, usize> {
        self.inner
            .networks
            .read()
            .get(network)
            .map(NetworkState::attester_counts)
            .unwrap_or_else(|| NetworkState::default().attester_counts())
    }

    pub fn staking_provider_snapshot(
        &self,
        network: &NetworkName,
    ) -> Option<StakingProviderSnapshot> {
        self.inner
            .networks
            .read()
            .get(network)
            .and_then(|state| state.staking_provider_snapshot.clone())
    }

    pub fn publisher_balances(&self, network: &NetworkName) -> BTreeMap<Address, PublisherBalance> {
        self.inner
            .networks
            .read()
            .get(network)
            .map(|state| state.publisher_balances.clone())
            .unwrap_or_default()
    }

    pub fn rewards_history(&self, network: &NetworkName) -> Vec<RewardsSnapshot> {
        self.inner
            .networks
            .read()
            .get(network)
            .map(|state| state.rewards_history.clone())
            .unwrap_or_default()
    }

    pub fn applied_config(&self, network: &NetworkName) -> Option<AppliedConfig> {
        self.inner
            .networks
            .read()
            .get(network)
            .and_then(|state| state.applied_external_config.clone())
    }

    // =========================================================================
    // MUTATORS
    // =========================================================================

    /// Move an attester to `new_state`.
    ///
    /// - Same state: no-op (no listener call, no flush).
    /// - Into `COINBASE_NEEDED`: only from no record, `NEW` or `IN_PROVIDER_QUEUE`.
    /// - Otherwise: stamps `last_updated`, notifies listeners, schedules a flush.
    pub fn update_attester_state(
        &self,
        network: &NetworkName,
        address: &Address,
        new_state: AttesterState,
    ) -> StateUpdate {
        let outcome = {
            let mut networks = self.inner.networks.write();
            let state = networks.entry(network.clone()).or_default();
            let current = state.attester_lifecycle.get(address).map(|r| r.state);

            match current {
                Some(cur) if cur == new_state => StateUpdate::Unchanged,
                Some(cur)
                    if new_state == AttesterState::CoinbaseNeeded
                        && !matches!(
                            cur,
                            AttesterState::New | AttesterState::InProviderQueue
                        ) =>
                {
                    StateUpdate::Rejected {
                        from: cur,
                        to: new_state,
                    }
                }
                _ => {
                    let now = now_millis();
                    let record = state
                        .attester_lifecycle
                        .entry(*address)
                        .or_insert_with(|| AttesterRecord::new(*address, new_state, now));
                    record.state = new_state;
                    record.last_updated = now;
                    StateUpdate::Applied {
                        from: current,
                        to: new_state,
                    }
                }
            }
        };

        match outcome {
            StateUpdate::Applied { from, to } => {
                info!(
                    network = %network,
                    attester = %address,
                    from = from.map(|s| s.as_str()).unwrap_or("-"),
                    to = %to,
                    "[store] Attester state updated"
                );
                self.notify_listeners(network, address, from, to);
                self.schedule_flush(network);
            }
            StateUpdate::Rejected { from, to } => {
                warn!(
                    network = %network,
                    attester = %address,
                    from = %from,
                    to = %to,
                    "[store] Refusing transition into COINBASE_NEEDED"
                );
            }
            StateUpdate::Unchanged => {}
        }
        outcome
    }

    /// Merge a freshly observed on-chain view into an attester record.
    ///
    /// Creates the record as `NEW` when absent. Lifecycle validation does not
    /// apply here. Returns whether anything changed.
    pub fn update_on_chain_view(
        &self,
        network: &NetworkName,
        address: &Address,
        view: Option<AttesterOnChainView>,
    ) -> bool {
        let (changed, created) = {
            let mut networks = self.inner.networks.write();
            let state = networks.entry(network.clone()).or_default();
            let created = !state.attester_lifecycle.contains_key(address);
            state.views_observed.insert(*address);
            let record = state
                .attester_lifecycle
                .entry(*address)
                .or_insert_with(|| AttesterRecord::new(*address, AttesterState::New, now_millis()));
            if record.on_chain_view == view && !created {
                (false, false)
            } else {
                record.on_chain_view = view;
                (true, created)
            }
        };

        if created {
            debug!(network = %network, attester = %address, "[store] Attester record created from on-chain view");
            self.notify_listeners(network, address, None, AttesterState::New);
        }
        if changed {
            self.schedule_flush(network);
        }
        changed
    }

    /// Replace the staking-provider snapshot; `None` marks it unavailable.
    pub fn update_staking_provider_snapshot(
        &self,
        network: &NetworkName,
        snapshot: Option<StakingProviderSnapshot>,
    ) {
        let mut networks = self.inner.networks.write();
        networks
            .entry(network.clone())
            .or_default()
            .staking_provider_snapshot = snapshot;
    }

    /// Merge publisher balances; publishers not mentioned keep their last value.
    pub fn update_publisher_balances(
        &self,
        network: &NetworkName,
        balances: impl IntoIterator<Item = (Address, PublisherBalance)>,
    ) {
        let mut networks = self.inner.networks.write();
        networks
            .entry(network.clone())
            .or_default()
            .publisher_balances
            .extend(balances);
    }

    /// Append rewards snapshots, dropping any `(coinbase, block_number)` already recorded.
    ///
    /// History is re-sorted by timestamp afterwards. Returns how many were added.
    pub fn record_rewards_snapshots(
        &self,
        network: &NetworkName,
        snapshots: impl IntoIterator<Item = RewardsSnapshot>,
    ) -> usize {
        let added = {
            let mut networks = self.inner.networks.write();
            let state = networks.entry(network.clone()).or_default();
            Self::merge_rewards(&mut state.rewards_history, snapshots)
        };

        if added > 0 {
            debug!(network = %network, added, "[store] Rewards snapshots recorded");
            self.schedule_flush(network);
        }
        added
    }

    /// Record the external configuration applied at startup.
    pub fn set_applied_config(&self, network: &NetworkName, config: AppliedConfig) {
        let mut networks = self.inner.networks.write();
        networks
            .entry(network.clone())
            .or_default()
            .applied_external_config = Some(config);
    }

    /// Startup reconciliation: raise an attester to `candidate` if it is more advanced.
    ///
    /// Unlike `update_attester_state` this may jump forward over several
    /// stages, and never moves an attester backwards. A missing record is
    /// created with `candidate`, or `NEW` without one.
    pub fn reconcile_attester_state(
        &self,
        network: &NetworkName,
        address: &Address,
        candidate: Option<AttesterState>,
    ) -> ReconcileOutcome {
        let outcome = {
            let mut networks = self.inner.networks.write();
            let state = networks.entry(network.clone()).or_default();
            let now = now_millis();

            match state.attester_lifecycle.get_mut(address) {
                None => {
                    let initial = candidate.unwrap_or(AttesterState::New);
                    state
                        .attester_lifecycle
                        .insert(*address, AttesterRecord::new(*address, initial, now));
                    ReconcileOutcome::Created(initial)
                }
                Some(record) => match candidate {
                    Some(hint) if hint.priority() > record.state.priority() => {
                        let from = record.state;
                        record.state = hint;
                        record.last_updated = now;
                        ReconcileOutcome::Advanced { from, to: hint }
                    }
                    _ => ReconcileOutcome::Unchanged(record.state),
                },
            }
        };

        match outcome {
            ReconcileOutcome::Created(state) => {
                self.notify_listeners(network, address, None, state);
                self.schedule_flush(network);
            }
            ReconcileOutcome::Advanced { from, to } => {
                info!(
                    network = %network,
                    attester = %address,
                    from = %from,
                    to = %to,
                    "[store] Reconciled attester to more advanced state"
                );
                self.notify_listeners(network, address, Some(from), to);
                self.schedule_flush(network);
            }
            ReconcileOutcome::Unchanged(_) => {}
        }
        outcome
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Load a network's persisted tables, replacing what is in memory for them.
    ///
    /// Invalid records are skipped by the codec. A corrupt file is logged and
    /// the table starts empty.
    pub fn load_network(&self, network: &NetworkName) -> StoreResult<LoadReport> {
        let persistence = self
            .inner
            .persistence
            .as_ref()
            .ok_or(StoreError::PersistenceDisabled)?;

        let mut report = LoadReport::default();

        let attesters = match persistence.load_attesters(network) {
            Ok(decoded) => {
                report.skipped += decoded.skipped;
                decoded.items
            }
            Err(e) => {
                error!(network = %network, error = %e, "[store] Attester lifecycle not loaded, starting empty");
                Vec::new()
            }
        };
        let rewards = match persistence.load_rewards(network) {
            Ok(decoded) => {
                report.skipped += decoded.skipped;
                decoded.items
            }
            Err(e) => {
                error!(network = %network, error = %e, "[store] Rewards history not loaded, starting empty");
                Vec::new()
            }
        };

        {
            let mut networks = self.inner.networks.write();
            let state = networks.entry(network.clone()).or_default();
            state.attester_lifecycle = attesters
                .into_iter()
                .map(|record| (record.address, record))
                .collect();
            state.rewards_history.clear();
            Self::merge_rewards(&mut state.rewards_history, rewards);
            report.attesters = state.attester_lifecycle.len();
            report.rewards = state.rewards_history.len();
        }

        info!(
            network = %network,
            attesters = report.attesters,
            rewards = report.rewards,
            skipped = report.skipped,
            "[store] Persisted state loaded"
        );
        Ok(report)
    }

    /// Whether a debounce window is open for this network.
    pub fn has_pending_flush(&self, network: &NetworkName) -> bool {
        self.inner
            .flushers
            .lock()
            .get(network)
            .map(|f| f.has_pending())
            .unwrap_or(false)
    }

    /// Debounce windows opened for this network so far.
    pub fn scheduled_flush_count(&self, network: &NetworkName) -> u64 {
        self.inner
            .flushers
            .lock()
            .get(network)
            .map(|f| f.scheduled_count())
            .unwrap_or(0)
    }

    /// Writes performed for this network so far.
    pub fn flush_count(&self, network: &NetworkName) -> u64 {
        self.inner
            .flushers
            .lock()
            .get(network)
            .map(|f| f.flush_count())
            .unwrap_or(0)
    }

    /// Write one network immediately, cancelling its open window.
    pub fn flush_now(&self, network: &NetworkName) {
        self.flusher(network).flush_now();
    }

    /// Write every network that has an open window. Returns how many were written.
    pub fn shutdown(&self) -> usize {
        let flushers: Vec<_> = self.inner.flushers.lock().values().cloned().collect();
        let flushed = flushers.iter().filter(|f| f.flush_pending()).count();
        info!(flushed, "[store] Pending state flushed at shutdown");
        flushed
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn schedule_flush(&self, network: &NetworkName) {
        if self.inner.persistence.is_none() {
            return;
        }
        self.flusher(network).schedule_flush();
    }

    fn flusher(&self, network: &NetworkName) -> Arc<DebouncedFlusher> {
        let mut flushers = self.inner.flushers.lock();
        Arc::clone(flushers.entry(network.clone()).or_insert_with(|| {
            let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
            let target = network.clone();
            Arc::new(DebouncedFlusher::new(
                format!("network {}", network),
                self.inner.config.flush_debounce,
                Arc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.persist_network(&target);
                    }
                }),
            ))
        }))
    }

    fn notify_listeners(
        &self,
        network: &NetworkName,
        address: &Address,
        from: Option<AttesterState>,
        to: AttesterState,
    ) {
        let listeners = self.inner.listeners.read().clone();
        for listener in listeners {
            listener.on_state_changed(network, address, from, to);
        }
    }

    fn merge_rewards(
        history: &mut Vec<RewardsSnapshot>,
        snapshots: impl IntoIterator<Item = RewardsSnapshot>,
    ) -> usize {
        let mut seen: HashSet<(Address, u64)> = history.iter().map(RewardsSnapshot::key).collect();
        let before = history.len();
        for snapshot in snapshots {
            if seen.insert(snapshot.key()) {
                history.push(snapshot);
            }
        }
        let added = history.len() - before;
        if added > 0 {
            history.sort_by_key(|s| (s.timestamp, s.block_number));
        }
        added
    }
}
