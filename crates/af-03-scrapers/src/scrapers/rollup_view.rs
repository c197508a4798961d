//! Rollup-view scraper
//!
//! Refreshes the on-chain view of every tracked attester, then re-evaluates
//! the lifecycle using the queue from the latest provider snapshot. When a
//! provider is configured but its snapshot is missing, the queue is unknown
//! and provider-queue attesters are not moved.

use crate::ports::DynChainClient;
use af_01_state_store::StateStore;
use af_02_lifecycle::LifecycleEngine;
use async_trait::async_trait;
use shared_types::{NetworkName, Scraper, ScraperError};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const ROLLUP_VIEW_SCRAPER: &str = "rollup-view";

pub struct RollupViewScraper {
    network: NetworkName,
    client: DynChainClient,
    store: Arc<StateStore>,
    engine: Arc<LifecycleEngine>,
    provider_configured: bool,
}

impl RollupViewScraper {
    pub fn new(
        network: NetworkName,
        client: DynChainClient,
        store: Arc<StateStore>,
        engine: Arc<LifecycleEngine>,
    ) -> Self {
        Self {
            network,
            client,
            store,
            engine,
            provider_configured: false,
        }
    }

    /// Whether the network has a staking provider whose queue is scraped.
    pub fn with_provider_queue(mut self, configured: bool) -> Self {
        self.provider_configured = configured;
        self
    }
}

#[async_trait]
impl Scraper for RollupViewScraper {
    fn name(&self) -> &'static str {
        ROLLUP_VIEW_SCRAPER
    }

    fn network(&self) -> &NetworkName {
        &self.network
    }

    async fn init(&self) -> Result<(), ScraperError> {
        self.client
            .check_connection()
            .await
            .map_err(|e| ScraperError::setup(ROLLUP_VIEW_SCRAPER, &self.network, e.to_string()))?;
        info!(network = %self.network, "[scraper:rollup-view] Initialised");
        Ok(())
    }

    async fn scrape(&self) -> Result<(), ScraperError> {
        let queue = self
            .store
            .staking_provider_snapshot(&self.network)
            .map(|snapshot| snapshot.queue_members);
        let tracked = self
            .engine
            .tracked_attesters(&self.network, queue.as_deref().unwrap_or_default());

        let mut failed = 0usize;
        let mut changed = 0usize;
        for address in &tracked {
            // Other scrapers may write between these awaits; each write is per-address.
            match self.client.get_attester_on_chain_view(address).await {
                Ok(view) => {
                    if self.store.update_on_chain_view(&self.network, address, view) {
                        changed += 1;
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        network = %self.network,
                        attester = %address,
                        error = %e,
                        "[scraper:rollup-view] On-chain view not refreshed"
                    );
                }
            }
        }

        let summary = match &queue {
            None if self.provider_configured => self.engine.evaluate_network_without_queue(&self.network),
            _ => self
                .engine
                .evaluate_network(&self.network, queue.as_deref().unwrap_or_default()),
        };
        debug!(
            network = %self.network,
            tracked = tracked.len(),
            changed,
            transitioned = summary.transitioned,
            deferred = summary.deferred,
            "[scraper:rollup-view] Views refreshed"
        );

        if failed > 0 {
            return Err(ScraperError::scrape(
                ROLLUP_VIEW_SCRAPER,
                &self.network,
                format!("{} of {} views could not be fetched", failed, tracked.len()),
            ));
        }
        Ok(())
    }
}
