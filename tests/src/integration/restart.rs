//! # Restart Reconciliation
//!
//! A store persisted by one run is reloaded by the next and reconciled with
//! the external roster: records never move backwards, hints only advance,
//! unknown roster entries start as `NEW`.

#[cfg(test)]
mod tests {
    use super::super::fixtures::addr;
    use af_01_state_store::{
        AttesterState, ConfiguredAttester, JsonFilePersistence, RewardsSnapshot, StateStore,
        StoreConfig,
    };
    use af_02_lifecycle::{NetworkBootstrapper, ReconciliationReport};
    use shared_types::{NetworkName, U256};
    use std::collections::BTreeSet;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn network() -> NetworkName {
        NetworkName::new("restart")
    }

    fn open(dir: &Path) -> Arc<StateStore> {
        Arc::new(StateStore::new(
            StoreConfig::default(),
            Some(Arc::new(JsonFilePersistence::new(dir))),
        ))
    }

    fn configured(byte: u8, hint: Option<AttesterState>) -> ConfiguredAttester {
        ConfiguredAttester {
            address: addr(byte),
            coinbase: Some(addr(0xcb)),
            last_known_state: hint,
        }
    }

    fn first_run(dir: &Path) {
        let store = open(dir);
        let report = NetworkBootstrapper::new(store.clone())
            .bootstrap(
                &network(),
                vec![
                    configured(0x0a, None),
                    configured(0x0b, Some(AttesterState::InEntryQueue)),
                    configured(0x0c, None),
                ],
            )
            .unwrap();
        assert_eq!(report.created, 3);

        store.update_attester_state(&network(), &addr(0x0a), AttesterState::Active);
        store.record_rewards_snapshots(
            &network(),
            vec![RewardsSnapshot {
                coinbase: addr(0xcb),
                attesters: BTreeSet::from([addr(0x0a), addr(0x0b), addr(0x0c)]),
                pending_rewards: U256::from(1_000u64),
                our_share: U256::from(100u64),
                other_share: U256::from(900u64),
                block_number: 5,
                timestamp: 1_000,
            }],
        );
        assert!(store.has_pending_flush(&network()));
        store.shutdown();
    }

    #[tokio::test]
    async fn test_restart_keeps_progress_and_applies_hints() {
        let dir = TempDir::new().unwrap();
        first_run(dir.path());

        let store = open(dir.path());
        let report = NetworkBootstrapper::new(store.clone())
            .bootstrap(
                &network(),
                vec![
                    // Stale hint below the persisted ACTIVE
                    configured(0x0a, Some(AttesterState::InProviderQueue)),
                    configured(0x0b, None),
                    // Hint ahead of the persisted NEW
                    configured(0x0c, Some(AttesterState::Active)),
                    configured(0x0d, None),
                ],
            )
            .unwrap();

        assert_eq!(
            report,
            ReconciliationReport {
                created: 1,
                advanced: 1,
                unchanged: 2,
            }
        );
        let state = |byte| store.attester(&network(), &addr(byte)).unwrap().state;
        assert_eq!(state(0x0a), AttesterState::Active);
        assert_eq!(state(0x0b), AttesterState::InEntryQueue);
        assert_eq!(state(0x0c), AttesterState::Active);
        assert_eq!(state(0x0d), AttesterState::New);

        let rewards = store.rewards_history(&network());
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].pending_rewards, U256::from(1_000u64));
        assert_eq!(
            store.applied_config(&network()).unwrap().attesters.len(),
            4
        );
    }

    #[tokio::test]
    async fn test_unreadable_record_is_rebuilt_from_roster() {
        let dir = TempDir::new().unwrap();
        first_run(dir.path());

        let path = dir.path().join("restart").join("attesters.json");
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"ACTIVE\""));
        std::fs::write(&path, raw.replace("\"ACTIVE\"", "\"RETIRED\"")).unwrap();

        let store = open(dir.path());
        let report = NetworkBootstrapper::new(store.clone())
            .bootstrap(&network(), vec![configured(0x0a, None)])
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(
            store.attester(&network(), &addr(0x0a)).unwrap().state,
            AttesterState::New
        );
        // Records not in the roster survive the reload
        assert_eq!(
            store.attester(&network(), &addr(0x0b)).unwrap().state,
            AttesterState::InEntryQueue
        );
    }
}
