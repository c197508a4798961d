//! # Scrapers (af-03)
//!
//! Independent polling units, one per network and concern. Each reads from a
//! `ChainClient` and writes into the shared `StateStore`; the provider-queue
//! and rollup-view scrapers also drive the lifecycle engine.
//!
//! ## Failure Policy
//!
//! - `init` failures are `Setup` errors (fatal for the orchestrator).
//! - A failed call for one attester, publisher or coinbase is logged and the
//!   rest of the cycle continues; the cycle then reports a `Scrape` error.
//! - A scraper never leaves partial state behind for a table it replaces
//!   wholesale: a failed provider scrape marks the snapshot absent.
//!
//! ## Crate Structure
//!
//! - `ports/` - `ChainClient`
//! - `adapters/` - `FileChainClient`, `MockChainClient`
//! - `scrapers/` - The four `Scraper` implementations

pub mod adapters;
pub mod error;
pub mod ports;
pub mod scrapers;

pub use adapters::{FileChainClient, MockCall, MockChainClient};
pub use error::{ChainClientError, ChainResult};
pub use ports::{ChainClient, DynChainClient, ProviderInfo};
pub use scrapers::{
    required_top_up, split_rewards, ProviderQueueScraper, PublisherBalanceScraper,
    RewardsScraper, RollupViewScraper, PROVIDER_QUEUE_SCRAPER, PUBLISHER_BALANCE_SCRAPER,
    REWARDS_SCRAPER, ROLLUP_VIEW_SCRAPER,
};
