//! Concrete scrapers, one per concern
//!
//! | Scraper | Reads | Writes |
//! |---------|-------|--------|
//! | `provider-queue` | registry entry + queue | provider snapshot, lifecycle |
//! | `rollup-view` | per-attester on-chain view | on-chain views, lifecycle |
//! | `publisher-balance` | publisher balances | publisher balances |
//! | `rewards` | pending rewards per coinbase | rewards history |

mod provider_queue;
mod publisher_balance;
mod rewards;
mod rollup_view;

pub use provider_queue::{ProviderQueueScraper, PROVIDER_QUEUE_SCRAPER};
pub use publisher_balance::{required_top_up, PublisherBalanceScraper, PUBLISHER_BALANCE_SCRAPER};
pub use rewards::{split_rewards, RewardsScraper, REWARDS_SCRAPER};
pub use rollup_view::{RollupViewScraper, ROLLUP_VIEW_SCRAPER};
