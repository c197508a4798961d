//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::{AttesterRecord, AttesterState, RewardsSnapshot};
use crate::error::PersistenceError;
use shared_types::{Address, NetworkName};

/// Items decoded from a persisted file, with the count of dropped records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded<T> {
    pub items: Vec<T>,
    /// Records that failed validation and were skipped.
    pub skipped: usize,
}

// Written out so `T` needs no `Default` of its own.
impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
        }
    }
}

/// Durable storage for the persisted table groups of a network.
///
/// Calls are synchronous so a shutdown flush completes before the process exits.
pub trait StatePersistence: Send + Sync {
    /// Load the attester lifecycle table. A missing file yields an empty table.
    fn load_attesters(
        &self,
        network: &NetworkName,
    ) -> Result<Decoded<AttesterRecord>, PersistenceError>;

    /// Replace the attester lifecycle table on disk.
    fn save_attesters(
        &self,
        network: &NetworkName,
        records: &[AttesterRecord],
    ) -> Result<(), PersistenceError>;

    /// Load the rewards history. A missing file yields an empty history.
    fn load_rewards(
        &self,
        network: &NetworkName,
    ) -> Result<Decoded<RewardsSnapshot>, PersistenceError>;

    /// Replace the rewards history on disk.
    fn save_rewards(
        &self,
        network: &NetworkName,
        snapshots: &[RewardsSnapshot],
    ) -> Result<(), PersistenceError>;
}

/// Observer of accepted lifecycle changes.
///
/// Called after the store lock is released; implementations must not block.
pub trait AttesterStateListener: Send + Sync {
    /// `from` is `None` when the record was created by this change.
    fn on_state_changed(
        &self,
        network: &NetworkName,
        address: &Address,
        from: Option<AttesterState>,
        to: AttesterState,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_decoded_is_empty_for_records_without_default() {
        let attesters = Decoded::<AttesterRecord>::default();
        assert!(attesters.items.is_empty());
        assert_eq!(attesters.skipped, 0);

        let rewards: Decoded<RewardsSnapshot> = Decoded::default();
        assert!(rewards.items.is_empty());
    }
}
