//! # Scraper Trait - Uniform Polling Units
//!
//! Defines the contract every polling unit implements so the orchestrator can
//! schedule it without knowing which external data it pulls.
//!
//! ## Capability Set
//!
//! - `init`: open connections, validate configuration (failure is fatal)
//! - `scrape`: one polling cycle (failure is logged, next tick retries)
//! - `shutdown`: release resources (failure is collected, never propagated)
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use shared_types::{NetworkName, Scraper, ScraperError};
//! use async_trait::async_trait;
//!
//! pub struct MyScraper { network: NetworkName }
//!
//! #[async_trait]
//! impl Scraper for MyScraper {
//!     fn name(&self) -> &'static str { "my-scraper" }
//!     fn network(&self) -> &NetworkName { &self.network }
//!     async fn scrape(&self) -> Result<(), ScraperError> { Ok(()) }
//! }
//! ```

use crate::entities::NetworkName;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Error raised by a scraper hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperError {
    /// Name of the scraper that failed.
    pub scraper: String,
    /// Network the scraper serves.
    pub network: NetworkName,
    /// Error kind.
    pub kind: ScraperErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl ScraperError {
    pub fn new(
        scraper: impl Into<String>,
        network: &NetworkName,
        kind: ScraperErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scraper: scraper.into(),
            network: network.clone(),
            kind,
            message: message.into(),
        }
    }

    /// Setup failure discovered during `init`.
    pub fn setup(scraper: &str, network: &NetworkName, message: impl Into<String>) -> Self {
        Self::new(scraper, network, ScraperErrorKind::Setup, message)
    }

    /// Transient failure during a polling cycle.
    pub fn scrape(scraper: &str, network: &NetworkName, message: impl Into<String>) -> Self {
        Self::new(scraper, network, ScraperErrorKind::Scrape, message)
    }

    /// Failure while releasing resources.
    pub fn teardown(scraper: &str, network: &NetworkName, message: impl Into<String>) -> Self {
        Self::new(scraper, network, ScraperErrorKind::Teardown, message)
    }
}

impl fmt::Display for ScraperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}@{}] {}: {}",
            self.scraper, self.network, self.kind, self.message
        )
    }
}

impl std::error::Error for ScraperError {}

/// Categories of scraper errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScraperErrorKind {
    /// Connection or configuration problem found at `init`. Fatal.
    Setup,
    /// Transient I/O failure during a cycle. Retried on the next tick.
    Scrape,
    /// Failure to release resources at shutdown.
    Teardown,
    /// Scraper configuration is invalid.
    Configuration,
}

impl fmt::Display for ScraperErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "Setup"),
            Self::Scrape => write!(f, "Scrape"),
            Self::Teardown => write!(f, "Teardown"),
            Self::Configuration => write!(f, "Configuration"),
        }
    }
}

/// The capability set shared by every polling unit.
///
/// One instance serves exactly one network and one concern.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Short, stable name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// The network this instance serves.
    fn network(&self) -> &NetworkName;

    /// Prepare the scraper. A failure aborts orchestrator startup.
    async fn init(&self) -> Result<(), ScraperError> {
        Ok(())
    }

    /// Run one polling cycle.
    async fn scrape(&self) -> Result<(), ScraperError>;

    /// Release resources. Default implementation does nothing.
    async fn shutdown(&self) -> Result<(), ScraperError> {
        Ok(())
    }
}

/// A type-erased scraper handle shared between the orchestrator and its timers.
pub type DynScraper = Arc<dyn Scraper>;
