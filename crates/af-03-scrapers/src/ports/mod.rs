//! Ports for the scrapers crate

pub mod outbound;

pub use outbound::{ChainClient, DynChainClient, ProviderInfo};
