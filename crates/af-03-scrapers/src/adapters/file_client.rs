//! Chain client backed by a JSON snapshot file.
//!
//! An external exporter decodes chain state into one document per network;
//! this client re-reads it on every call so a refreshed file is picked up
//! without a restart.
//!
//! ```json
//! {
//!   "block_number": 1200,
//!   "providers": { "7": { "queue": ["0x.."], "admin": "0x..", "rewards_recipient": "0x.." } },
//!   "attesters": { "0x..": { "status": "VALIDATING", "effective_balance": "2000", "exit_info": null } },
//!   "balances": { "0x..": "1000000000000000000" },
//!   "pending_rewards": { "0x..": "42" }
//! }
//! ```

use crate::error::{ChainClientError, ChainResult};
use crate::ports::{ChainClient, ProviderInfo};
use af_01_state_store::{AttesterOnChainView, ExitInfo, OnChainStatus};
use async_trait::async_trait;
use serde::Deserialize;
use shared_types::{parse_decimal_u256, Address, U256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct ChainSnapshot {
    #[serde(default)]
    block_number: u64,
    #[serde(default)]
    providers: HashMap<u64, ProviderEntry>,
    #[serde(default)]
    attesters: HashMap<Address, ViewEntry>,
    #[serde(default)]
    balances: HashMap<Address, String>,
    #[serde(default)]
    pending_rewards: HashMap<Address, String>,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    #[serde(default)]
    queue: Vec<Address>,
    admin: Address,
    rewards_recipient: Address,
}

#[derive(Debug, Deserialize)]
struct ViewEntry {
    status: String,
    effective_balance: String,
    #[serde(default)]
    exit_info: Option<ExitEntry>,
}

#[derive(Debug, Deserialize)]
struct ExitEntry {
    amount: String,
    exitable_at: u64,
    recipient: Address,
}

fn decode_amount(raw: &str) -> ChainResult<U256> {
    parse_decimal_u256(raw).map_err(|e| ChainClientError::Decode(e.to_string()))
}

impl ViewEntry {
    fn to_view(&self) -> ChainResult<AttesterOnChainView> {
        let status: OnChainStatus = self
            .status
            .parse()
            .map_err(|e: shared_types::ParseError| ChainClientError::Decode(e.to_string()))?;
        let exit_info = match &self.exit_info {
            Some(exit) => Some(ExitInfo {
                amount: decode_amount(&exit.amount)?,
                exitable_at: exit.exitable_at,
                recipient: exit.recipient,
            }),
            None => None,
        };
        Ok(AttesterOnChainView {
            status,
            effective_balance: decode_amount(&self.effective_balance)?,
            exit_info,
        })
    }
}

/// File-backed `ChainClient`.
pub struct FileChainClient {
    path: PathBuf,
}

impl FileChainClient {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn snapshot(&self) -> ChainResult<ChainSnapshot> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ChainClientError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;
        let snapshot: ChainSnapshot = serde_json::from_str(&raw).map_err(|e| {
            ChainClientError::Decode(format!("{}: {}", self.path.display(), e))
        })?;
        debug!(
            path = %self.path.display(),
            block = snapshot.block_number,
            "[chain] Snapshot read"
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl ChainClient for FileChainClient {
    async fn check_connection(&self) -> ChainResult<()> {
        self.snapshot().await.map(|_| ())
    }

    async fn get_provider_queue(&self, provider_id: u64) -> ChainResult<Vec<Address>> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .providers
            .get(&provider_id)
            .map(|p| p.queue.clone())
            .unwrap_or_default())
    }

    async fn get_provider_queue_length(&self, provider_id: u64) -> ChainResult<u64> {
        Ok(self.get_provider_queue(provider_id).await?.len() as u64)
    }

    async fn get_staking_provider(&self, provider_id: u64) -> ChainResult<Option<ProviderInfo>> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.providers.get(&provider_id).map(|p| ProviderInfo {
            admin: p.admin,
            rewards_recipient: p.rewards_recipient,
        }))
    }

    async fn get_attester_on_chain_view(
        &self,
        address: &Address,
    ) -> ChainResult<Option<AttesterOnChainView>> {
        let snapshot = self.snapshot().await?;
        snapshot
            .attesters
            .get(address)
            .map(ViewEntry::to_view)
            .transpose()
    }

    async fn get_balance(&self, address: &Address) -> ChainResult<U256> {
        let snapshot = self.snapshot().await?;
        match snapshot.balances.get(address) {
            Some(raw) => decode_amount(raw),
            None => Ok(U256::zero()),
        }
    }

    async fn get_pending_rewards(&self, coinbase: &Address) -> ChainResult<U256> {
        let snapshot = self.snapshot().await?;
        match snapshot.pending_rewards.get(coinbase) {
            Some(raw) => decode_amount(raw),
            None => Ok(U256::zero()),
        }
    }

    async fn get_block_number(&self) -> ChainResult<u64> {
        Ok(self.snapshot().await?.block_number)
    }
}
