//! In-memory chain client for tests.

use crate::error::{ChainClientError, ChainResult};
use crate::ports::{ChainClient, ProviderInfo};
use af_01_state_store::AttesterOnChainView;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Address, U256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Calls that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MockCall {
    CheckConnection,
    ProviderQueue,
    ProviderQueueLength,
    StakingProvider,
    OnChainView,
    Balance,
    PendingRewards,
    BlockNumber,
}

#[derive(Default)]
struct MockChainState {
    providers: HashMap<u64, (ProviderInfo, Vec<Address>)>,
    views: HashMap<Address, AttesterOnChainView>,
    balances: HashMap<Address, U256>,
    pending_rewards: HashMap<Address, U256>,
    block_number: u64,
    failing: HashSet<MockCall>,
    failing_addresses: HashSet<Address>,
}

/// Scriptable chain client: set values, inject failures, count calls.
#[derive(Default)]
pub struct MockChainClient {
    state: RwLock<MockChainState>,
    calls: AtomicU64,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_provider(&self, provider_id: u64, info: ProviderInfo, queue: Vec<Address>) {
        self.state.write().providers.insert(provider_id, (info, queue));
    }

    pub fn set_queue(&self, provider_id: u64, queue: Vec<Address>) {
        let mut state = self.state.write();
        let entry = state.providers.entry(provider_id).or_insert_with(|| {
            (
                ProviderInfo {
                    admin: Address::ZERO,
                    rewards_recipient: Address::ZERO,
                },
                Vec::new(),
            )
        });
        entry.1 = queue;
    }

    /// `None` removes the attester from the rollup.
    pub fn set_view(&self, address: Address, view: Option<AttesterOnChainView>) {
        let mut state = self.state.write();
        match view {
            Some(view) => state.views.insert(address, view),
            None => state.views.remove(&address),
        };
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.state.write().balances.insert(address, balance);
    }

    pub fn set_pending_rewards(&self, coinbase: Address, amount: U256) {
        self.state.write().pending_rewards.insert(coinbase, amount);
    }

    pub fn set_block_number(&self, block: u64) {
        self.state.write().block_number = block;
    }

    pub fn fail(&self, call: MockCall) {
        self.state.write().failing.insert(call);
    }

    pub fn recover(&self, call: MockCall) {
        self.state.write().failing.remove(&call);
    }

    /// Make every per-address call for this address fail.
    pub fn fail_address(&self, address: Address) {
        self.state.write().failing_addresses.insert(address);
    }

    /// Total calls made, across all methods.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, call: MockCall, address: Option<&Address>) -> ChainResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read();
        if state.failing.contains(&call) {
            return Err(ChainClientError::Unavailable(format!("injected {:?} failure", call)));
        }
        if let Some(address) = address {
            if state.failing_addresses.contains(address) {
                return Err(ChainClientError::Unavailable(format!(
                    "injected failure for {}",
                    address
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn check_connection(&self) -> ChainResult<()> {
        self.enter(MockCall::CheckConnection, None)
    }

    async fn get_provider_queue(&self, provider_id: u64) -> ChainResult<Vec<Address>> {
        self.enter(MockCall::ProviderQueue, None)?;
        Ok(self
            .state
            .read()
            .providers
            .get(&provider_id)
            .map(|(_, queue)| queue.clone())
            .unwrap_or_default())
    }

    async fn get_provider_queue_length(&self, provider_id: u64) -> ChainResult<u64> {
        self.enter(MockCall::ProviderQueueLength, None)?;
        Ok(self
            .state
            .read()
            .providers
            .get(&provider_id)
            .map(|(_, queue)| queue.len() as u64)
            .unwrap_or(0))
    }

    async fn get_staking_provider(&self, provider_id: u64) -> ChainResult<Option<ProviderInfo>> {
        self.enter(MockCall::StakingProvider, None)?;
        Ok(self
            .state
            .read()
            .providers
            .get(&provider_id)
            .map(|(info, _)| info.clone()))
    }

    async fn get_attester_on_chain_view(
        &self,
        address: &Address,
    ) -> ChainResult<Option<AttesterOnChainView>> {
        self.enter(MockCall::OnChainView, Some(address))?;
        Ok(self.state.read().views.get(address).cloned())
    }

    async fn get_balance(&self, address: &Address) -> ChainResult<U256> {
        self.enter(MockCall::Balance, Some(address))?;
        Ok(self
            .state
            .read()
            .balances
            .get(address)
            .copied()
            .unwrap_or_default())
    }

    async fn get_pending_rewards(&self, coinbase: &Address) -> ChainResult<U256> {
        self.enter(MockCall::PendingRewards, Some(coinbase))?;
        Ok(self
            .state
            .read()
            .pending_rewards
            .get(coinbase)
            .copied()
            .unwrap_or_default())
    }

    async fn get_block_number(&self) -> ChainResult<u64> {
        self.enter(MockCall::BlockNumber, None)?;
        Ok(self.state.read().block_number)
    }
}
