//! # Attester Lifecycle (af-02)
//!
//! Decides how each attester moves through its lifecycle, and reconciles
//! persisted state with the external roster at startup.
//!
//! ## Transition Table
//!
//! | Current | Observed | Next |
//! |---------|----------|------|
//! | (none) | validating | `ACTIVE` |
//! | (none) | present, not validating | `IN_ENTRY_QUEUE` |
//! | (none) | in provider queue | `IN_PROVIDER_QUEUE` |
//! | (none) | nothing | `NEW` |
//! | `NEW` | joins provider queue | `IN_PROVIDER_QUEUE` |
//! | `NEW` | present / validating | `IN_ENTRY_QUEUE` / `ACTIVE` |
//! | `IN_PROVIDER_QUEUE` | left queue + present / validating | `IN_ENTRY_QUEUE` / `ACTIVE` |
//! | `IN_ENTRY_QUEUE` | validating | `ACTIVE` |
//! | `ACTIVE` | zombie / exiting | `NO_LONGER_ACTIVE` |
//! | `ACTIVE` | not validating | stays, critical alert |
//! | `NO_LONGER_ACTIVE` | anything | stays |
//!
//! Coinbase assignment never influences a transition.
//!
//! ## Crate Structure
//!
//! - `domain/` - Pure rules (`next_state`, `reconcile`)
//! - `ports/` - Alert sink
//! - `service` - `LifecycleEngine`, applies rules through the store
//! - `bootstrap` - Roster loading and `NetworkBootstrapper`

pub mod bootstrap;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use bootstrap::{load_roster, parse_roster, NetworkBootstrapper, ReconciliationReport};
pub use domain::{next_state, reconcile, AlertKind, Decision, OnChainSignal, Signals};
pub use error::{LifecycleError, LifecycleResult};
pub use ports::LifecycleAlertSink;
pub use service::{EvaluationOutcome, EvaluationSummary, LifecycleEngine};
