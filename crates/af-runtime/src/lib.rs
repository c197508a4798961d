//! # Attester Fleet Node Runtime
//!
//! Library side of the `af-node` binary, exposed for tests.
//!
//! ## Modules
//!
//! - `config` - TOML configuration with environment overrides
//! - `node` - Store, per-network bootstrapping and orchestrators, shutdown
//! - `http` - `/metrics` and `/health` endpoints
//!
//! Each configured network gets its own `ScraperOrchestrator`, so a network
//! whose scrapers fail to initialise is left out without stopping the rest.

pub mod config;
pub mod error;
pub mod http;
pub mod node;

pub use config::{ConfigError, NetworkConfig, RuntimeConfig, DEFAULT_CONFIG_PATH};
pub use error::{RuntimeError, RuntimeResult};
pub use node::{AfNode, NetworkRuntime};
