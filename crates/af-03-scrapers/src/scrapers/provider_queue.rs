//! Provider-queue scraper
//!
//! Pulls the staking provider's registry entry and queue, replaces the
//! network's provider snapshot, then drives the lifecycle engine over every
//! tracked attester.

use crate::ports::DynChainClient;
use af_01_state_store::{StakingProviderSnapshot, StateStore};
use af_02_lifecycle::LifecycleEngine;
use async_trait::async_trait;
use shared_types::{now_millis, NetworkName, Scraper, ScraperError};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const PROVIDER_QUEUE_SCRAPER: &str = "provider-queue";

pub struct ProviderQueueScraper {
    network: NetworkName,
    /// `None` when no provider is configured for this network.
    provider_id: Option<u64>,
    client: DynChainClient,
    store: Arc<StateStore>,
    engine: Arc<LifecycleEngine>,
}

impl ProviderQueueScraper {
    pub fn new(
        network: NetworkName,
        provider_id: Option<u64>,
        client: DynChainClient,
        store: Arc<StateStore>,
        engine: Arc<LifecycleEngine>,
    ) -> Self {
        Self {
            network,
            provider_id,
            client,
            store,
            engine,
        }
    }

    async fn fetch_snapshot(&self, provider_id: u64) -> Result<StakingProviderSnapshot, ScraperError> {
        let fail = |e: crate::error::ChainClientError| {
            ScraperError::scrape(PROVIDER_QUEUE_SCRAPER, &self.network, e.to_string())
        };

        let info = self
            .client
            .get_staking_provider(provider_id)
            .await
            .map_err(fail)?
            .ok_or_else(|| {
                ScraperError::scrape(
                    PROVIDER_QUEUE_SCRAPER,
                    &self.network,
                    format!("staking provider {} not registered", provider_id),
                )
            })?;
        let queue_members = self.client.get_provider_queue(provider_id).await.map_err(fail)?;
        let queue_length = self
            .client
            .get_provider_queue_length(provider_id)
            .await
            .map_err(fail)?;

        if queue_length != queue_members.len() as u64 {
            // The two calls are not atomic; the queue may move in between.
            debug!(
                network = %self.network,
                reported = queue_length,
                listed = queue_members.len(),
                "[scraper:provider-queue] Queue length and member list disagree"
            );
        }

        Ok(StakingProviderSnapshot {
            provider_id,
            queue_length,
            queue_members,
            admin_address: info.admin,
            rewards_recipient: info.rewards_recipient,
            observed_at: now_millis(),
        })
    }
}

#[async_trait]
impl Scraper for ProviderQueueScraper {
    fn name(&self) -> &'static str {
        PROVIDER_QUEUE_SCRAPER
    }

    fn network(&self) -> &NetworkName {
        &self.network
    }

    async fn init(&self) -> Result<(), ScraperError> {
        self.client
            .check_connection()
            .await
            .map_err(|e| ScraperError::setup(PROVIDER_QUEUE_SCRAPER, &self.network, e.to_string()))?;
        match self.provider_id {
            Some(id) => info!(network = %self.network, provider_id = id, "[scraper:provider-queue] Initialised"),
            None => warn!(network = %self.network, "[scraper:provider-queue] No staking provider configured"),
        }
        Ok(())
    }

    async fn scrape(&self) -> Result<(), ScraperError> {
        let Some(provider_id) = self.provider_id else {
            self.store.update_staking_provider_snapshot(&self.network, None);
            self.engine.evaluate_network(&self.network, &[]);
            return Ok(());
        };

        let snapshot = match self.fetch_snapshot(provider_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.store.update_staking_provider_snapshot(&self.network, None);
                return Err(e);
            }
        };

        let queue = snapshot.queue_members.clone();
        debug!(
            network = %self.network,
            provider_id,
            queue_length = snapshot.queue_length,
            "[scraper:provider-queue] Snapshot updated"
        );
        self.store
            .update_staking_provider_snapshot(&self.network, Some(snapshot));
        self.engine.evaluate_network(&self.network, &queue);
        Ok(())
    }
}
