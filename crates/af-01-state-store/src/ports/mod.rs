//! Ports module for the State Store

pub mod outbound;

pub use outbound::{AttesterStateListener, Decoded, StatePersistence};
