//! # Attester Fleet Monitor Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── lifecycle_flow.rs     # Scrapers driving an attester through its lifecycle
//!     ├── scraper_isolation.rs  # One failing scraper, the rest keep their schedule
//!     └── restart.rs            # Persisted state + roster reconciliation on restart
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p af-tests
//! cargo test -p af-tests integration::restart::
//! ```

pub mod integration;
