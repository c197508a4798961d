//! # Attester State Store (af-01)
//!
//! Per-network in-memory tables that every scraper and the lifecycle engine
//! read and write, plus their durable JSON form.
//!
//! ## Tables (per network)
//!
//! | Table | Persisted | Written by |
//! |-------|-----------|------------|
//! | Staking-provider snapshot | no | provider-queue scraper |
//! | Attester lifecycle | yes | lifecycle engine, rollup-view scraper, bootstrap |
//! | Publisher balances | no | publisher-balance scraper |
//! | Rewards history | yes | rewards scraper |
//! | Applied external config | no | bootstrap |
//!
//! ## Store Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Idempotent updates | Same-state update is a no-op: no stamp, no listener, no flush |
//! | Coinbase guard | `COINBASE_NEEDED` only reachable from no record, `NEW` or `IN_PROVIDER_QUEUE` |
//! | Snapshot reads | Readers get owned copies, never the live tables |
//! | Rewards dedupe | At most one snapshot per `(coinbase, block_number)` |
//! | Debounced writes | One write per open window; shutdown writes what is pending |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Lifecycle states, attester records, per-network tables
//! - `ports/` - Persistence SPI and state-change listener
//! - `adapters/` - JSON-file and in-memory persistence
//! - `codec` - Versionless JSON encoding shared by both adapters
//! - `flusher` - Debounce timer
//! - `store` - `StateStore`, the single owner of all tables
//!
//! ## Usage
//!
//! ```ignore
//! use af_01_state_store::{JsonFilePersistence, StateStore, StoreConfig};
//!
//! let persistence = Arc::new(JsonFilePersistence::new("./data"));
//! let store = StateStore::new(StoreConfig::default(), Some(persistence));
//! store.load_network(&network)?;
//!
//! store.update_attester_state(&network, &address, AttesterState::InProviderQueue);
//!
//! // On shutdown
//! store.shutdown();
//! ```

pub mod adapters;
pub mod codec;
pub mod domain;
pub mod error;
pub mod flusher;
pub mod ports;
pub mod store;

// Re-export key types for convenience
pub use adapters::{InMemoryPersistence, JsonFilePersistence};
pub use domain::{
    AppliedConfig, AttesterOnChainView, AttesterRecord, AttesterState, ConfiguredAttester,
    ExitInfo, NetworkState, OnChainStatus, PublisherBalance, RewardsSnapshot,
    StakingProviderSnapshot,
};
pub use error::{PersistenceError, StoreError, StoreResult};
pub use flusher::DebouncedFlusher;
pub use ports::{AttesterStateListener, Decoded, StatePersistence};
pub use store::{
    LoadReport, ReconcileOutcome, StateStore, StateUpdate, StoreConfig, DEFAULT_FLUSH_DEBOUNCE,
};
