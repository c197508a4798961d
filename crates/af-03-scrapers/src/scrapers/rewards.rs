//! Rewards scraper
//!
//! For every coinbase in the applied attester roster, records the pending
//! rewards at the current block, split between the provider and the rest.

use crate::ports::DynChainClient;
use af_01_state_store::{RewardsSnapshot, StateStore};
use async_trait::async_trait;
use shared_types::{now_millis, NetworkName, Scraper, ScraperError, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const REWARDS_SCRAPER: &str = "rewards";

const BPS_DENOMINATOR: u64 = 10_000;

/// Split `pending` into `(our_share, other_share)` at `take_rate_bps`.
///
/// Rates above 100% are clamped. Computed without intermediate overflow.
pub fn split_rewards(pending: U256, take_rate_bps: u32) -> (U256, U256) {
    let bps = U256::from(u64::from(take_rate_bps).min(BPS_DENOMINATOR));
    let denominator = U256::from(BPS_DENOMINATOR);
    let ours = (pending / denominator) * bps + (pending % denominator) * bps / denominator;
    (ours, pending - ours)
}

pub struct RewardsScraper {
    network: NetworkName,
    take_rate_bps: u32,
    client: DynChainClient,
    store: Arc<StateStore>,
}

impl RewardsScraper {
    pub fn new(
        network: NetworkName,
        take_rate_bps: u32,
        client: DynChainClient,
        store: Arc<StateStore>,
    ) -> Self {
        Self {
            network,
            take_rate_bps,
            client,
            store,
        }
    }
}

#[async_trait]
impl Scraper for RewardsScraper {
    fn name(&self) -> &'static str {
        REWARDS_SCRAPER
    }

    fn network(&self) -> &NetworkName {
        &self.network
    }

    async fn init(&self) -> Result<(), ScraperError> {
        self.client
            .check_connection()
            .await
            .map_err(|e| ScraperError::setup(REWARDS_SCRAPER, &self.network, e.to_string()))?;
        info!(
            network = %self.network,
            take_rate_bps = self.take_rate_bps,
            "[scraper:rewards] Initialised"
        );
        Ok(())
    }

    async fn scrape(&self) -> Result<(), ScraperError> {
        let assignments = self
            .store
            .applied_config(&self.network)
            .map(|config| config.coinbase_assignments())
            .unwrap_or_default();
        if assignments.is_empty() {
            debug!(network = %self.network, "[scraper:rewards] No coinbase assignments, nothing to do");
            return Ok(());
        }

        let block_number = self
            .client
            .get_block_number()
            .await
            .map_err(|e| ScraperError::scrape(REWARDS_SCRAPER, &self.network, e.to_string()))?;

        let mut snapshots = Vec::with_capacity(assignments.len());
        let mut failed = 0usize;
        for (coinbase, attesters) in assignments {
            match self.client.get_pending_rewards(&coinbase).await {
                Ok(pending_rewards) => {
                    let (our_share, other_share) =
                        split_rewards(pending_rewards, self.take_rate_bps);
                    snapshots.push(RewardsSnapshot {
                        coinbase,
                        attesters,
                        pending_rewards,
                        our_share,
                        other_share,
                        block_number,
                        timestamp: now_millis(),
                    });
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        network = %self.network,
                        coinbase = %coinbase,
                        error = %e,
                        "[scraper:rewards] Pending rewards not fetched"
                    );
                }
            }
        }

        let added = self.store.record_rewards_snapshots(&self.network, snapshots);
        debug!(network = %self.network, block_number, added, "[scraper:rewards] Rewards recorded");

        if failed > 0 {
            return Err(ScraperError::scrape(
                REWARDS_SCRAPER,
                &self.network,
                format!("{} coinbase(s) could not be queried", failed),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockChainClient;
    use af_01_state_store::{AppliedConfig, ConfiguredAttester};
    use shared_types::Address;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    fn configured(byte: u8, coinbase: Option<u8>) -> ConfiguredAttester {
        ConfiguredAttester {
            address: addr(byte),
            coinbase: coinbase.map(addr),
            last_known_state: None,
        }
    }

    #[test]
    fn test_split_rewards() {
        let (ours, theirs) = split_rewards(U256::from(1_000u64), 1_000);
        assert_eq!(ours, U256::from(100u64));
        assert_eq!(theirs, U256::from(900u64));

        let (ours, theirs) = split_rewards(U256::from(1_000u64), 20_000);
        assert_eq!(ours, U256::from(1_000u64));
        assert_eq!(theirs, U256::zero());

        // No overflow near the top of the range
        let (ours, theirs) = split_rewards(U256::MAX, 5_000);
        assert_eq!(ours + theirs, U256::MAX);
    }

    #[tokio::test]
    async fn test_snapshot_per_coinbase_deduped_by_block() {
        let client = Arc::new(MockChainClient::new());
        let store = Arc::new(StateStore::in_memory());
        let network = NetworkName::new("testnet");
        store.set_applied_config(
            &network,
            AppliedConfig {
                attesters: vec![
                    configured(1, Some(9)),
                    configured(2, Some(9)),
                    configured(3, Some(8)),
                    configured(4, None),
                ],
                applied_at: 0,
            },
        );
        client.set_block_number(100);
        client.set_pending_rewards(addr(9), U256::from(10_000u64));

        let scraper = RewardsScraper::new(network.clone(), 2_500, client.clone(), store.clone());
        scraper.scrape().await.unwrap();
        scraper.scrape().await.unwrap();

        let history = store.rewards_history(&network);
        assert_eq!(history.len(), 2);
        let nine = history.iter().find(|s| s.coinbase == addr(9)).unwrap();
        assert_eq!(nine.attesters.len(), 2);
        assert_eq!(nine.our_share, U256::from(2_500u64));
        assert_eq!(nine.other_share, U256::from(7_500u64));

        client.set_block_number(101);
        scraper.scrape().await.unwrap();
        assert_eq!(store.rewards_history(&network).len(), 4);
    }

    #[tokio::test]
    async fn test_without_roster_makes_no_calls() {
        let client = Arc::new(MockChainClient::new());
        let store = Arc::new(StateStore::in_memory());
        let scraper = RewardsScraper::new(NetworkName::new("testnet"), 1_000, client.clone(), store);
        scraper.scrape().await.unwrap();
        assert_eq!(client.call_count(), 0);
    }
}
