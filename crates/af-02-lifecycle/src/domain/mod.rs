//! Domain module for the Lifecycle Engine
//!
//! - transition: pure next-state rules
//! - reconcile: startup priority rule

pub mod reconcile;
pub mod transition;

pub use reconcile::reconcile;
pub use transition::{next_state, AlertKind, Decision, OnChainSignal, Signals};
