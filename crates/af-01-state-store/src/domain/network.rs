//! Per-network tables

use super::lifecycle::{AttesterRecord, AttesterState};
use shared_types::{Address, TimestampMs, U256};
use std::collections::{BTreeMap, BTreeSet};

/// Point-in-time view of the staking provider's registry entry and queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StakingProviderSnapshot {
    pub provider_id: u64,
    pub queue_length: u64,
    /// Queue order as reported by the registry.
    pub queue_members: Vec<Address>,
    pub admin_address: Address,
    pub rewards_recipient: Address,
    pub observed_at: TimestampMs,
}

impl StakingProviderSnapshot {
    pub fn contains(&self, address: &Address) -> bool {
        self.queue_members.contains(address)
    }
}

/// Balance of one publisher account and how much it needs to stay funded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublisherBalance {
    pub current_balance: U256,
    pub required_top_up: U256,
    pub observed_at: TimestampMs,
}

/// Rewards accrued by one coinbase at one block.
///
/// Immutable once recorded; unique per `(coinbase, block_number)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardsSnapshot {
    pub coinbase: Address,
    pub attesters: BTreeSet<Address>,
    pub pending_rewards: U256,
    pub our_share: U256,
    pub other_share: U256,
    pub block_number: u64,
    pub timestamp: TimestampMs,
}

impl RewardsSnapshot {
    /// Dedupe key.
    pub fn key(&self) -> (Address, u64) {
        (self.coinbase, self.block_number)
    }
}

/// One entry of the external attester roster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfiguredAttester {
    pub address: Address,
    /// Reward attribution; orthogonal to the lifecycle.
    pub coinbase: Option<Address>,
    /// Hint used once, during startup reconciliation.
    pub last_known_state: Option<AttesterState>,
}

/// The external configuration last applied to a network.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppliedConfig {
    pub attesters: Vec<ConfiguredAttester>,
    pub applied_at: TimestampMs,
}

impl AppliedConfig {
    /// Attesters grouped by their configured coinbase.
    pub fn coinbase_assignments(&self) -> BTreeMap<Address, BTreeSet<Address>> {
        let mut groups: BTreeMap<Address, BTreeSet<Address>> = BTreeMap::new();
        for attester in &self.attesters {
            if let Some(coinbase) = attester.coinbase {
                groups.entry(coinbase).or_default().insert(attester.address);
            }
        }
        groups
    }

    pub fn coinbase_of(&self, address: &Address) -> Option<Address> {
        self.attesters
            .iter()
            .find(|a| a.address == *address)
            .and_then(|a| a.coinbase)
    }
}

/// All state held for one network.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkState {
    /// Absent until a provider scrape succeeds, and after a failed one.
    pub staking_provider_snapshot: Option<StakingProviderSnapshot>,
    pub attester_lifecycle: BTreeMap<Address, AttesterRecord>,
    pub publisher_balances: BTreeMap<Address, PublisherBalance>,
    /// Sorted by timestamp.
    pub rewards_history: Vec<RewardsSnapshot>,
    pub applied_external_config: Option<AppliedConfig>,
    /// Attesters whose on-chain view was fetched since startup. Not persisted.
    pub views_observed: BTreeSet<Address>,
}

impl NetworkState {
    /// Number of attesters in each lifecycle state (every state present, zero included).
    pub fn attester_counts(&self) -> BTreeMap<AttesterState, usize> {
        let mut counts: BTreeMap<AttesterState, usize> =
            AttesterState::ALL.into_iter().map(|s| (s, 0)).collect();
        for record in self.attester_lifecycle.values() {
            *counts.entry(record.state).or_default() += 1;
        }
        counts
    }

    /// Latest snapshot per coinbase.
    pub fn latest_rewards(&self) -> BTreeMap<Address, RewardsSnapshot> {
        let mut latest: BTreeMap<Address, RewardsSnapshot> = BTreeMap::new();
        for snapshot in &self.rewards_history {
            match latest.get(&snapshot.coinbase) {
                Some(existing) if existing.block_number >= snapshot.block_number => {}
                _ => {
                    latest.insert(snapshot.coinbase, snapshot.clone());
                }
            }
        }
        latest
    }
}
