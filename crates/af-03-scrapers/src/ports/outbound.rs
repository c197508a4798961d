//! # Outbound Ports
//!
//! The chain client is the only external dependency of the scrapers. It hands
//! back already-decoded domain values; wire formats live behind it.

use crate::error::ChainResult;
use af_01_state_store::AttesterOnChainView;
use async_trait::async_trait;
use shared_types::{Address, U256};
use std::sync::Arc;

/// Registry entry of a staking provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderInfo {
    pub admin: Address,
    pub rewards_recipient: Address,
}

/// Read-only chain access for one network.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Verify the backend is reachable. Called from scraper `init`.
    async fn check_connection(&self) -> ChainResult<()>;

    /// Ordered queue of attesters waiting with a staking provider.
    async fn get_provider_queue(&self, provider_id: u64) -> ChainResult<Vec<Address>>;

    async fn get_provider_queue_length(&self, provider_id: u64) -> ChainResult<u64>;

    /// `None` when the registry has no such provider.
    async fn get_staking_provider(&self, provider_id: u64) -> ChainResult<Option<ProviderInfo>>;

    /// `None` when the rollup has never heard of the attester.
    async fn get_attester_on_chain_view(
        &self,
        address: &Address,
    ) -> ChainResult<Option<AttesterOnChainView>>;

    async fn get_balance(&self, address: &Address) -> ChainResult<U256>;

    /// Unclaimed rewards accrued to a coinbase.
    async fn get_pending_rewards(&self, coinbase: &Address) -> ChainResult<U256>;

    async fn get_block_number(&self) -> ChainResult<u64>;
}

pub type DynChainClient = Arc<dyn ChainClient>;
