//! # Scraper Orchestrator (af-04)
//!
//! Runs a set of `Scraper`s, each on its own interval, with one warm-up pass
//! at startup.
//!
//! ## Failure Isolation
//!
//! | Hook | Failure handling |
//! |------|------------------|
//! | `init` | Fatal: `init()` returns the first setup error |
//! | `scrape` | Logged and counted; next tick retries |
//! | `shutdown` | Collected and returned; never raised |
//!
//! ## Usage
//!
//! ```ignore
//! let mut orchestrator = ScraperOrchestrator::new();
//! orchestrator.register(Arc::new(provider_queue), Duration::from_secs(60))?;
//! orchestrator.register(Arc::new(rollup_view), Duration::from_secs(60))?;
//!
//! orchestrator.init().await?;
//! orchestrator.start().await?;
//! // ...
//! let teardown_errors = orchestrator.shutdown().await;
//! ```

pub mod error;
pub mod orchestrator;
pub mod ports;

pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Phase, ScraperOrchestrator, ScraperStats, ScraperStatsEntry};
pub use ports::{ScrapeObserver, ScrapeOutcome};
