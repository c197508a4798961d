//! Attester lifecycle entities
//!
//! The lifecycle is a total order. Two independently derived states can be
//! compared and the more advanced one wins:
//!
//! ```text
//! NEW < IN_PROVIDER_QUEUE < COINBASE_NEEDED < IN_ENTRY_QUEUE < ACTIVE < NO_LONGER_ACTIVE
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{Address, ParseError, TimestampMs, U256};
use std::fmt;
use std::str::FromStr;

/// Lifecycle stage of one attester.
///
/// Variant order is the priority order; `Ord` is derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttesterState {
    /// Known locally, nothing observed on-chain yet.
    New,
    /// Waiting in the staking provider's queue.
    InProviderQueue,
    /// Legacy stage: waiting for a coinbase assignment.
    CoinbaseNeeded,
    /// Deposited, waiting in the rollup entry queue.
    InEntryQueue,
    /// Validating on the rollup.
    Active,
    /// Exiting or zombie. Terminal.
    NoLongerActive,
}

impl AttesterState {
    /// Every state, in priority order.
    pub const ALL: [AttesterState; 6] = [
        AttesterState::New,
        AttesterState::InProviderQueue,
        AttesterState::CoinbaseNeeded,
        AttesterState::InEntryQueue,
        AttesterState::Active,
        AttesterState::NoLongerActive,
    ];

    /// Numeric priority; higher means further along the lifecycle.
    pub fn priority(self) -> u8 {
        match self {
            AttesterState::New => 0,
            AttesterState::InProviderQueue => 1,
            AttesterState::CoinbaseNeeded => 2,
            AttesterState::InEntryQueue => 3,
            AttesterState::Active => 4,
            AttesterState::NoLongerActive => 5,
        }
    }

    /// Canonical textual form, as written to disk and used as a metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            AttesterState::New => "NEW",
            AttesterState::InProviderQueue => "IN_PROVIDER_QUEUE",
            AttesterState::CoinbaseNeeded => "COINBASE_NEEDED",
            AttesterState::InEntryQueue => "IN_ENTRY_QUEUE",
            AttesterState::Active => "ACTIVE",
            AttesterState::NoLongerActive => "NO_LONGER_ACTIVE",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AttesterState::NoLongerActive)
    }

    /// The higher-priority of two candidate states.
    pub fn most_advanced(a: AttesterState, b: AttesterState) -> AttesterState {
        if b.priority() > a.priority() {
            b
        } else {
            a
        }
    }
}

impl fmt::Display for AttesterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttesterState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttesterState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownVariant {
                kind: "attester state",
                input: s.to_string(),
            })
    }
}

/// Rollup-reported status of an attester.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnChainStatus {
    /// Known to the rollup but not in the validator set.
    None,
    Validating,
    Zombie,
    Exiting,
}

impl OnChainStatus {
    pub const ALL: [OnChainStatus; 4] = [
        OnChainStatus::None,
        OnChainStatus::Validating,
        OnChainStatus::Zombie,
        OnChainStatus::Exiting,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OnChainStatus::None => "NONE",
            OnChainStatus::Validating => "VALIDATING",
            OnChainStatus::Zombie => "ZOMBIE",
            OnChainStatus::Exiting => "EXITING",
        }
    }
}

impl fmt::Display for OnChainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnChainStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OnChainStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownVariant {
                kind: "on-chain status",
                input: s.to_string(),
            })
    }
}

/// Pending withdrawal of an exiting attester.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExitInfo {
    pub amount: U256,
    /// Unix seconds after which the withdrawal can be finalised.
    pub exitable_at: u64,
    pub recipient: Address,
}

/// What the rollup contract reports about one attester.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttesterOnChainView {
    pub status: OnChainStatus,
    pub effective_balance: U256,
    pub exit_info: Option<ExitInfo>,
}

impl AttesterOnChainView {
    pub fn new(status: OnChainStatus, effective_balance: U256) -> Self {
        Self {
            status,
            effective_balance,
            exit_info: None,
        }
    }
}

/// One tracked attester.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttesterRecord {
    pub address: Address,
    pub state: AttesterState,
    pub last_updated: TimestampMs,
    pub on_chain_view: Option<AttesterOnChainView>,
}

impl AttesterRecord {
    pub fn new(address: Address, state: AttesterState, now: TimestampMs) -> Self {
        Self {
            address,
            state,
            last_updated: now,
            on_chain_view: None,
        }
    }
}
