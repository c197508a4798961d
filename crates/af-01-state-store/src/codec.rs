//! # Persisted File Codec
//!
//! Converts the in-memory tables to and from their on-disk JSON form.
//!
//! ## Format
//!
//! Attester lifecycle file (object keyed by address):
//!
//! ```json
//! {
//!   "0xabc...": {
//!     "state": "ACTIVE",
//!     "last_updated": "1718000000000",
//!     "on_chain_view": { "status": "VALIDATING", "effective_balance": "200000000000000000000000" }
//!   }
//! }
//! ```
//!
//! Rewards history file (array ordered by timestamp). Every numeric field is a
//! decimal string so values above 2^53 survive JSON tooling unchanged.
//!
//! Decoding is lenient per record: a record with an unknown enum value or an
//! unparsable number is logged and skipped, the rest of the file still loads.
//! Unknown fields are ignored.

use crate::domain::{
    AttesterOnChainView, AttesterRecord, AttesterState, ExitInfo, OnChainStatus, RewardsSnapshot,
};
use crate::error::PersistenceError;
use crate::ports::Decoded;
use serde::{Deserialize, Serialize};
use shared_types::{parse_decimal_u256, parse_decimal_u64, Address, NetworkName};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
struct AttesterRecordDto {
    state: String,
    last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_chain_view: Option<OnChainViewDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OnChainViewDto {
    status: String,
    effective_balance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exit_info: Option<ExitInfoDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExitInfoDto {
    amount: String,
    exitable_at: String,
    recipient: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RewardsSnapshotDto {
    coinbase: String,
    attesters: Vec<String>,
    pending_rewards: String,
    our_share: String,
    other_share: String,
    block_number: String,
    timestamp: String,
}

impl From<&AttesterRecord> for AttesterRecordDto {
    fn from(record: &AttesterRecord) -> Self {
        Self {
            state: record.state.as_str().to_string(),
            last_updated: record.last_updated.to_string(),
            on_chain_view: record.on_chain_view.as_ref().map(|view| OnChainViewDto {
                status: view.status.as_str().to_string(),
                effective_balance: view.effective_balance.to_string(),
                exit_info: view.exit_info.as_ref().map(|exit| ExitInfoDto {
                    amount: exit.amount.to_string(),
                    exitable_at: exit.exitable_at.to_string(),
                    recipient: exit.recipient.to_string(),
                }),
            }),
        }
    }
}

impl AttesterRecordDto {
    fn into_record(self, address: Address) -> Result<AttesterRecord, String> {
        let state: AttesterState = self.state.parse().map_err(|e| format!("{e}"))?;
        let last_updated = parse_decimal_u64(&self.last_updated).map_err(|e| format!("{e}"))?;
        let on_chain_view = match self.on_chain_view {
            Some(view) => Some(view.into_view()?),
            None => None,
        };
        Ok(AttesterRecord {
            address,
            state,
            last_updated,
            on_chain_view,
        })
    }
}

impl OnChainViewDto {
    fn into_view(self) -> Result<AttesterOnChainView, String> {
        let status: OnChainStatus = self.status.parse().map_err(|e| format!("{e}"))?;
        let effective_balance =
            parse_decimal_u256(&self.effective_balance).map_err(|e| format!("{e}"))?;
        let exit_info = match self.exit_info {
            Some(exit) => Some(ExitInfo {
                amount: parse_decimal_u256(&exit.amount).map_err(|e| format!("{e}"))?,
                exitable_at: parse_decimal_u64(&exit.exitable_at).map_err(|e| format!("{e}"))?,
                recipient: exit.recipient.parse().map_err(|e| format!("{e}"))?,
            }),
            None => None,
        };
        Ok(AttesterOnChainView {
            status,
            effective_balance,
            exit_info,
        })
    }
}

impl From<&RewardsSnapshot> for RewardsSnapshotDto {
    fn from(snapshot: &RewardsSnapshot) -> Self {
        Self {
            coinbase: snapshot.coinbase.to_string(),
            attesters: snapshot.attesters.iter().map(|a| a.to_string()).collect(),
            pending_rewards: snapshot.pending_rewards.to_string(),
            our_share: snapshot.our_share.to_string(),
            other_share: snapshot.other_share.to_string(),
            block_number: snapshot.block_number.to_string(),
            timestamp: snapshot.timestamp.to_string(),
        }
    }
}

impl RewardsSnapshotDto {
    fn into_snapshot(self) -> Result<RewardsSnapshot, String> {
        let attesters = self
            .attesters
            .iter()
            .map(|a| a.parse::<Address>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("{e}"))?;
        Ok(RewardsSnapshot {
            coinbase: self.coinbase.parse().map_err(|e| format!("{e}"))?,
            attesters,
            pending_rewards: parse_decimal_u256(&self.pending_rewards)
                .map_err(|e| format!("{e}"))?,
            our_share: parse_decimal_u256(&self.our_share).map_err(|e| format!("{e}"))?,
            other_share: parse_decimal_u256(&self.other_share).map_err(|e| format!("{e}"))?,
            block_number: parse_decimal_u64(&self.block_number).map_err(|e| format!("{e}"))?,
            timestamp: parse_decimal_u64(&self.timestamp).map_err(|e| format!("{e}"))?,
        })
    }
}

/// Render the attester lifecycle table.
pub fn encode_attesters(records: &[AttesterRecord]) -> Result<String, PersistenceError> {
    let file: BTreeMap<String, AttesterRecordDto> = records
        .iter()
        .map(|record| (record.address.to_string(), AttesterRecordDto::from(record)))
        .collect();
    serde_json::to_string_pretty(&file).map_err(|e| PersistenceError::Encode(e.to_string()))
}

/// Parse the attester lifecycle table, skipping invalid records.
pub fn decode_attesters(
    network: &NetworkName,
    path: &str,
    raw: &str,
) -> Result<Decoded<AttesterRecord>, PersistenceError> {
    let file: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| PersistenceError::Corrupt {
            path: path.to_string(),
            message: e.to_string(),
        })?;

    let mut decoded = Decoded::default();
    for (key, value) in file {
        let parsed = key
            .parse::<Address>()
            .map_err(|e| format!("{e}"))
            .and_then(|address| {
                serde_json::from_value::<AttesterRecordDto>(value)
                    .map_err(|e| e.to_string())
                    .and_then(|dto| dto.into_record(address))
            });
        match parsed {
            Ok(record) => decoded.items.push(record),
            Err(reason) => {
                warn!(
                    network = %network,
                    attester = %key,
                    reason = %reason,
                    "[store] Skipping invalid attester record"
                );
                decoded.skipped += 1;
            }
        }
    }
    Ok(decoded)
}

/// Render the rewards history.
pub fn encode_rewards(snapshots: &[RewardsSnapshot]) -> Result<String, PersistenceError> {
    let file: Vec<RewardsSnapshotDto> = snapshots.iter().map(RewardsSnapshotDto::from).collect();
    serde_json::to_string_pretty(&file).map_err(|e| PersistenceError::Encode(e.to_string()))
}

/// Parse the rewards history, skipping invalid snapshots.
pub fn decode_rewards(
    network: &NetworkName,
    path: &str,
    raw: &str,
) -> Result<Decoded<RewardsSnapshot>, PersistenceError> {
    let file: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| PersistenceError::Corrupt {
            path: path.to_string(),
            message: e.to_string(),
        })?;

    let mut decoded = Decoded::default();
    for (index, value) in file.into_iter().enumerate() {
        let parsed = serde_json::from_value::<RewardsSnapshotDto>(value)
            .map_err(|e| e.to_string())
            .and_then(RewardsSnapshotDto::into_snapshot);
        match parsed {
            Ok(snapshot) => decoded.items.push(snapshot),
            Err(reason) => {
                warn!(
                    network = %network,
                    index,
                    reason = %reason,
                    "[store] Skipping invalid rewards snapshot"
                );
                decoded.skipped += 1;
            }
        }
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::U256;
    use std::collections::BTreeSet;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    fn network() -> NetworkName {
        NetworkName::new("testnet")
    }

    #[test]
    fn test_numbers_are_written_as_decimal_strings() {
        let mut record = AttesterRecord::new(addr(1), AttesterState::Active, 1_718_000_000_000);
        record.on_chain_view = Some(AttesterOnChainView {
            status: OnChainStatus::Exiting,
            effective_balance: U256::from(10u64).pow(U256::from(24u64)),
            exit_info: Some(ExitInfo {
                amount: U256::from(5u64),
                exitable_at: 1_800_000_000,
                recipient: addr(7),
            }),
        });

        let json = encode_attesters(&[record.clone()]).unwrap();
        assert!(json.contains("\"effective_balance\": \"1000000000000000000000000\""));
        assert!(json.contains("\"last_updated\": \"1718000000000\""));

        let decoded = decode_attesters(&network(), "attesters.json", &json).unwrap();
        assert_eq!(decoded.skipped, 0);
        assert_eq!(decoded.items, vec![record]);
    }

    #[test]
    fn test_invalid_records_are_skipped() {
        let raw = r#"{
            "0x0101010101010101010101010101010101010101": { "state": "ACTIVE", "last_updated": "5" },
            "0x0202020202020202020202020202020202020202": { "state": "PROMOTED", "last_updated": "5" },
            "0x0303030303030303030303030303030303030303": { "state": "NEW", "last_updated": "soon" },
            "not-an-address": { "state": "NEW", "last_updated": "5" },
            "0x0404040404040404040404040404040404040404": {
                "state": "IN_ENTRY_QUEUE",
                "last_updated": "7",
                "on_chain_view": { "status": "SLASHED", "effective_balance": "1" }
            }
        }"#;

        let decoded = decode_attesters(&network(), "attesters.json", raw).unwrap();
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(decoded.items[0].address, addr(1));
        assert_eq!(decoded.skipped, 4);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let raw = r#"{
            "0x0101010101010101010101010101010101010101": {
                "state": "NEW",
                "last_updated": "1",
                "coinbase": "0x0909090909090909090909090909090909090909",
                "future_field": { "nested": true }
            }
        }"#;

        let decoded = decode_attesters(&network(), "attesters.json", raw).unwrap();
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(decoded.items[0].state, AttesterState::New);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let result = decode_attesters(&network(), "attesters.json", "{ not json");
        assert!(matches!(result, Err(PersistenceError::Corrupt { .. })));
    }

    #[test]
    fn test_rewards_decode_skips_bad_entries() {
        let good = RewardsSnapshot {
            coinbase: addr(9),
            attesters: BTreeSet::from([addr(1), addr(2)]),
            pending_rewards: U256::from(1000u64),
            our_share: U256::from(100u64),
            other_share: U256::from(900u64),
            block_number: 42,
            timestamp: 99,
        };
        let mut json: Vec<serde_json::Value> =
            serde_json::from_str(&encode_rewards(&[good.clone()]).unwrap()).unwrap();
        json.push(serde_json::json!({ "coinbase": "0x09", "block_number": "x" }));
        let raw = serde_json::to_string(&json).unwrap();

        let decoded = decode_rewards(&network(), "rewards.json", &raw).unwrap();
        assert_eq!(decoded.items, vec![good]);
        assert_eq!(decoded.skipped, 1);
    }
}
