//! Publisher-balance scraper
//!
//! Reads the balance of each configured publisher account and how far it is
//! below the configured minimum.

use crate::ports::DynChainClient;
use af_01_state_store::{PublisherBalance, StateStore};
use async_trait::async_trait;
use shared_types::{now_millis, Address, NetworkName, Scraper, ScraperError, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const PUBLISHER_BALANCE_SCRAPER: &str = "publisher-balance";

/// Amount needed to bring `current` up to `minimum`; zero when already funded.
pub fn required_top_up(current: U256, minimum: U256) -> U256 {
    minimum.saturating_sub(current)
}

pub struct PublisherBalanceScraper {
    network: NetworkName,
    publishers: Vec<Address>,
    min_balance: U256,
    client: DynChainClient,
    store: Arc<StateStore>,
}

impl PublisherBalanceScraper {
    pub fn new(
        network: NetworkName,
        publishers: Vec<Address>,
        min_balance: U256,
        client: DynChainClient,
        store: Arc<StateStore>,
    ) -> Self {
        Self {
            network,
            publishers,
            min_balance,
            client,
            store,
        }
    }
}

#[async_trait]
impl Scraper for PublisherBalanceScraper {
    fn name(&self) -> &'static str {
        PUBLISHER_BALANCE_SCRAPER
    }

    fn network(&self) -> &NetworkName {
        &self.network
    }

    async fn init(&self) -> Result<(), ScraperError> {
        self.client.check_connection().await.map_err(|e| {
            ScraperError::setup(PUBLISHER_BALANCE_SCRAPER, &self.network, e.to_string())
        })?;
        info!(
            network = %self.network,
            publishers = self.publishers.len(),
            min_balance = %self.min_balance,
            "[scraper:publisher-balance] Initialised"
        );
        Ok(())
    }

    async fn scrape(&self) -> Result<(), ScraperError> {
        let mut balances = Vec::with_capacity(self.publishers.len());
        let mut failed = 0usize;

        for publisher in &self.publishers {
            match self.client.get_balance(publisher).await {
                Ok(current_balance) => balances.push((
                    *publisher,
                    PublisherBalance {
                        current_balance,
                        required_top_up: required_top_up(current_balance, self.min_balance),
                        observed_at: now_millis(),
                    },
                )),
                Err(e) => {
                    failed += 1;
                    warn!(
                        network = %self.network,
                        publisher = %publisher,
                        error = %e,
                        "[scraper:publisher-balance] Balance not refreshed"
                    );
                }
            }
        }

        let refreshed = balances.len();
        self.store.update_publisher_balances(&self.network, balances);
        debug!(network = %self.network, refreshed, "[scraper:publisher-balance] Balances updated");

        if failed > 0 {
            return Err(ScraperError::scrape(
                PUBLISHER_BALANCE_SCRAPER,
                &self.network,
                format!("{} of {} balances could not be fetched", failed, self.publishers.len()),
            ));
        }
        Ok(())
    }
}
