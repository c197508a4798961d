use crate::codec;
use crate::domain::{AttesterRecord, RewardsSnapshot};
use crate::error::PersistenceError;
use crate::ports::{Decoded, StatePersistence};
use parking_lot::Mutex;
use shared_types::NetworkName;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory persistence that still goes through the JSON codec.
///
/// Keeps the encoded documents so tests can inspect exactly what would hit disk.
#[derive(Default)]
pub struct InMemoryPersistence {
    attesters: Mutex<HashMap<NetworkName, String>>,
    rewards: Mutex<HashMap<NetworkName, String>>,
    attester_saves: AtomicUsize,
    rewards_saves: AtomicUsize,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw attesters document, as if it had been written by a previous run.
    pub fn seed_attesters(&self, network: &NetworkName, raw: impl Into<String>) {
        self.attesters.lock().insert(network.clone(), raw.into());
    }

    pub fn seed_rewards(&self, network: &NetworkName, raw: impl Into<String>) {
        self.rewards.lock().insert(network.clone(), raw.into());
    }

    pub fn attesters_document(&self, network: &NetworkName) -> Option<String> {
        self.attesters.lock().get(network).cloned()
    }

    pub fn rewards_document(&self, network: &NetworkName) -> Option<String> {
        self.rewards.lock().get(network).cloned()
    }

    /// Number of attester-table writes across all networks.
    pub fn attester_saves(&self) -> usize {
        self.attester_saves.load(Ordering::SeqCst)
    }

    pub fn rewards_saves(&self) -> usize {
        self.rewards_saves.load(Ordering::SeqCst)
    }
}

impl StatePersistence for InMemoryPersistence {
    fn load_attesters(
        &self,
        network: &NetworkName,
    ) -> Result<Decoded<AttesterRecord>, PersistenceError> {
        match self.attesters.lock().get(network) {
            Some(raw) => codec::decode_attesters(network, "memory://attesters", raw),
            None => Ok(Decoded::default()),
        }
    }

    fn save_attesters(
        &self,
        network: &NetworkName,
        records: &[AttesterRecord],
    ) -> Result<(), PersistenceError> {
        let content = codec::encode_attesters(records)?;
        self.attesters.lock().insert(network.clone(), content);
        self.attester_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_rewards(
        &self,
        network: &NetworkName,
    ) -> Result<Decoded<RewardsSnapshot>, PersistenceError> {
        match self.rewards.lock().get(network) {
            Some(raw) => codec::decode_rewards(network, "memory://rewards", raw),
            None => Ok(Decoded::default()),
        }
    }

    fn save_rewards(
        &self,
        network: &NetworkName,
        snapshots: &[RewardsSnapshot],
    ) -> Result<(), PersistenceError> {
        let content = codec::encode_rewards(snapshots)?;
        self.rewards.lock().insert(network.clone(), content);
        self.rewards_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
