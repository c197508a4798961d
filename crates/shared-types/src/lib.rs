//! # Shared Types Crate
//!
//! Domain primitives and the scraper capability trait shared by every crate
//! of the attester fleet monitor.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses, network names and amounts are
//!   defined once here.
//! - **Normalised identity**: an `Address` has exactly one textual form, so
//!   per-attester tables never hold two entries for one account.
//! - **Uniform scheduling**: every polling unit implements `Scraper`; the
//!   orchestrator depends on nothing else.

pub mod entities;
pub mod errors;
pub mod scraper_trait;

pub use entities::*;
pub use errors::*;
pub use scraper_trait::{DynScraper, Scraper, ScraperError, ScraperErrorKind};
