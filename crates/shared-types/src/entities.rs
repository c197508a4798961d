//! # Core Domain Entities
//!
//! Primitives every crate of the fleet monitor speaks in:
//!
//! - **Identity**: `Address` (case-normalised 20-byte account), `NetworkName`
//! - **Amounts**: `U256` for balances and rewards (arbitrary precision on-chain values)
//! - **Time**: Unix milliseconds (`TimestampMs`)

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::ParseError;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// Unix timestamp in milliseconds.
pub type TimestampMs = u64;

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> TimestampMs {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// A 20-byte account address.
///
/// Parsing accepts any hex casing (with or without `0x`); rendering is always
/// lower-case with a `0x` prefix, so two spellings of one address compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Build an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the zero address (treated as "unset" by providers).
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_part.len() != 40 {
            return Err(ParseError::InvalidAddress {
                input: s.to_string(),
                reason: format!("expected 40 hex characters, got {}", hex_part.len()),
            });
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part.to_ascii_lowercase(), &mut bytes).map_err(|e| {
            ParseError::InvalidAddress {
                input: s.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Name of a configured network (e.g. `mainnet`, `testnet`).
///
/// Used as the key of every per-network table and as a metrics label.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkName(String);

impl NetworkName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkName({})", self.0)
    }
}

impl From<&str> for NetworkName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NetworkName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Parse a decimal string into a `U256`.
///
/// Persisted files and configuration carry amounts as decimal strings.
pub fn parse_decimal_u256(input: &str) -> Result<U256, ParseError> {
    U256::from_dec_str(input.trim()).map_err(|e| ParseError::InvalidNumber {
        input: input.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Parse a decimal string into a `u64`.
pub fn parse_decimal_u64(input: &str) -> Result<u64, ParseError> {
    input
        .trim()
        .parse::<u64>()
        .map_err(|e| ParseError::InvalidNumber {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

/// Convert a `U256` into an `f64` for gauge export. Precision loss above 2^53 is accepted.
pub fn u256_to_f64(value: U256) -> f64 {
    let mut result = 0f64;
    for (i, limb) in value.0.iter().enumerate() {
        result += (*limb as f64) * 2f64.powi(64 * i as i32);
    }
    result
}
