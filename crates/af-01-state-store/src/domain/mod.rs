//! Domain module for the State Store
//!
//! - lifecycle: attester lifecycle states, on-chain views, records
//! - network: per-network tables (provider snapshot, balances, rewards, applied config)

pub mod lifecycle;
pub mod network;

pub use lifecycle::{AttesterOnChainView, AttesterRecord, AttesterState, ExitInfo, OnChainStatus};
pub use network::{
    AppliedConfig, ConfiguredAttester, NetworkState, PublisherBalance, RewardsSnapshot,
    StakingProviderSnapshot,
};
