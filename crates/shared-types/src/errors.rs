//! # Error Types
//!
//! Errors shared by more than one crate.

use thiserror::Error;

/// Failure to parse a primitive from its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Address is not 20 bytes of hex.
    #[error("Invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    /// Number is not a valid decimal integer.
    #[error("Invalid number {input:?}: {reason}")]
    InvalidNumber { input: String, reason: String },

    /// Enumerated value not recognised.
    #[error("Unknown {kind} value {input:?}")]
    UnknownVariant { kind: &'static str, input: String },
}
