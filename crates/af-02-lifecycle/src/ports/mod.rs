//! Ports for the Lifecycle crate

pub mod outbound;

pub use outbound::LifecycleAlertSink;
