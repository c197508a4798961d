//! # Lifecycle Flow
//!
//! Provider-queue and rollup-view scrapers driving attesters through the
//! lifecycle against a mock chain.
//!
//! ```text
//! queue ──→ IN_PROVIDER_QUEUE ──validating──→ ACTIVE ──exiting──→ NO_LONGER_ACTIVE
//! roster ─→ NEW ──deposited──→ IN_ENTRY_QUEUE ──validating──→ ACTIVE
//! ```

#[cfg(test)]
mod tests {
    use super::super::fixtures::{addr, provider, TransitionLog, PROVIDER_ID};
    use af_01_state_store::{
        AttesterOnChainView, AttesterState, ConfiguredAttester, OnChainStatus, StateStore,
    };
    use af_02_lifecycle::{LifecycleEngine, NetworkBootstrapper};
    use af_03_scrapers::{MockChainClient, ProviderQueueScraper, RollupViewScraper};
    use af_telemetry::metrics::LIFECYCLE_ALERTS;
    use af_telemetry::MetricsRecorder;
    use shared_types::{NetworkName, Scraper, U256};
    use std::sync::Arc;

    struct Harness {
        client: Arc<MockChainClient>,
        store: Arc<StateStore>,
        log: Arc<TransitionLog>,
        provider_queue: ProviderQueueScraper,
        rollup_view: RollupViewScraper,
    }

    fn harness(network: &str) -> Harness {
        let network = NetworkName::new(network);
        let client = Arc::new(MockChainClient::new());
        let store = Arc::new(StateStore::in_memory());
        let log = Arc::new(TransitionLog::default());
        store.add_listener(log.clone());

        let engine = Arc::new(LifecycleEngine::new(store.clone()));
        engine.add_alert_sink(Arc::new(MetricsRecorder::new().unwrap()));

        Harness {
            provider_queue: ProviderQueueScraper::new(
                network.clone(),
                Some(PROVIDER_ID),
                client.clone(),
                store.clone(),
                engine.clone(),
            ),
            rollup_view: RollupViewScraper::new(network, client.clone(), store.clone(), engine)
                .with_provider_queue(true),
            client,
            store,
            log,
        }
    }

    fn view(status: OnChainStatus) -> Option<AttesterOnChainView> {
        Some(AttesterOnChainView::new(status, U256::from(2_000u64)))
    }

    #[tokio::test]
    async fn test_queue_to_active_to_exited() {
        let h = harness("flow-exit");
        let network = NetworkName::new("flow-exit");
        let a = addr(0x0a);

        // Queued at the provider
        h.client.set_provider(PROVIDER_ID, provider(), vec![a]);
        h.provider_queue.scrape().await.unwrap();
        assert_eq!(
            h.store.attester(&network, &a).unwrap().state,
            AttesterState::InProviderQueue
        );

        // Leaves the queue, starts validating
        h.client.set_queue(PROVIDER_ID, vec![]);
        h.provider_queue.scrape().await.unwrap();
        h.client.set_view(a, view(OnChainStatus::Validating));
        h.rollup_view.scrape().await.unwrap();
        assert_eq!(h.store.attester(&network, &a).unwrap().state, AttesterState::Active);

        // Exits
        h.client.set_view(a, view(OnChainStatus::Exiting));
        h.rollup_view.scrape().await.unwrap();
        assert_eq!(
            h.store.attester(&network, &a).unwrap().state,
            AttesterState::NoLongerActive
        );

        // Terminal: validating again changes nothing
        h.client.set_view(a, view(OnChainStatus::Validating));
        h.rollup_view.scrape().await.unwrap();
        h.provider_queue.scrape().await.unwrap();
        assert_eq!(
            h.store.attester(&network, &a).unwrap().state,
            AttesterState::NoLongerActive
        );

        assert_eq!(
            h.log.path_of(&a),
            vec![
                AttesterState::InProviderQueue,
                AttesterState::Active,
                AttesterState::NoLongerActive,
            ]
        );
    }

    #[tokio::test]
    async fn test_roster_attester_through_entry_queue() {
        let h = harness("flow-entry");
        let network = NetworkName::new("flow-entry");
        let b = addr(0x0b);
        h.client.set_provider(PROVIDER_ID, provider(), vec![]);
        h.store.update_attester_state(&network, &b, AttesterState::New);

        // Not on chain yet: stays NEW
        h.provider_queue.scrape().await.unwrap();
        h.rollup_view.scrape().await.unwrap();
        assert_eq!(h.store.attester(&network, &b).unwrap().state, AttesterState::New);

        h.client.set_view(b, view(OnChainStatus::None));
        h.rollup_view.scrape().await.unwrap();
        assert_eq!(
            h.store.attester(&network, &b).unwrap().state,
            AttesterState::InEntryQueue
        );

        h.client.set_view(b, view(OnChainStatus::Validating));
        h.rollup_view.scrape().await.unwrap();
        assert_eq!(h.store.attester(&network, &b).unwrap().state, AttesterState::Active);

        assert_eq!(
            h.log.path_of(&b),
            vec![
                AttesterState::New,
                AttesterState::InEntryQueue,
                AttesterState::Active,
            ]
        );
    }

    #[tokio::test]
    async fn test_active_attester_dropping_off_chain_raises_alert() {
        let h = harness("flow-alert");
        let network = NetworkName::new("flow-alert");
        let c = addr(0x0c);
        h.client.set_provider(PROVIDER_ID, provider(), vec![]);
        h.client.set_view(c, view(OnChainStatus::Validating));
        h.store.update_attester_state(&network, &c, AttesterState::New);

        h.rollup_view.scrape().await.unwrap();
        assert_eq!(h.store.attester(&network, &c).unwrap().state, AttesterState::Active);

        h.client.set_view(c, None);
        h.rollup_view.scrape().await.unwrap();

        // Alert only: the record is not moved
        assert_eq!(h.store.attester(&network, &c).unwrap().state, AttesterState::Active);
        assert!(h.store.attester(&network, &c).unwrap().on_chain_view.is_none());
        assert_eq!(
            LIFECYCLE_ALERTS
                .with_label_values(&["flow-alert", "active_not_validating"])
                .get(),
            1.0
        );
    }

    #[tokio::test]
    async fn test_bootstrapped_active_attester_quiet_during_provider_warm_up() {
        let h = harness("flow-warm-up");
        let network = NetworkName::new("flow-warm-up");
        let d = addr(0x0d);
        NetworkBootstrapper::new(h.store.clone())
            .bootstrap(
                &network,
                vec![ConfiguredAttester {
                    address: d,
                    coinbase: None,
                    last_known_state: Some(AttesterState::Active),
                }],
            )
            .unwrap();
        let alerts = || {
            LIFECYCLE_ALERTS
                .with_label_values(&["flow-warm-up", "active_not_validating"])
                .get()
        };

        // Provider warm-up runs before the rollup view is ever fetched
        h.client.set_provider(PROVIDER_ID, provider(), vec![]);
        h.provider_queue.scrape().await.unwrap();
        assert_eq!(alerts(), 0.0);
        assert_eq!(h.store.attester(&network, &d).unwrap().state, AttesterState::Active);

        // The rollup has no record of it: that is a loss worth raising
        h.rollup_view.scrape().await.unwrap();
        assert_eq!(alerts(), 1.0);
    }

    #[tokio::test]
    async fn test_failed_provider_scrape_clears_snapshot_only() {
        let h = harness("flow-provider-down");
        let network = NetworkName::new("flow-provider-down");
        let a = addr(0x0a);
        h.client.set_provider(PROVIDER_ID, provider(), vec![a]);
        h.provider_queue.scrape().await.unwrap();
        assert!(h.store.staking_provider_snapshot(&network).is_some());

        h.client.fail(af_03_scrapers::MockCall::ProviderQueue);
        assert!(h.provider_queue.scrape().await.is_err());

        assert!(h.store.staking_provider_snapshot(&network).is_none());
        assert_eq!(
            h.store.attester(&network, &a).unwrap().state,
            AttesterState::InProviderQueue
        );

        // Validating, but whether it left the queue is unknown: no move
        h.client.set_view(a, view(OnChainStatus::Validating));
        h.rollup_view.scrape().await.unwrap();
        assert_eq!(
            h.store.attester(&network, &a).unwrap().state,
            AttesterState::InProviderQueue
        );

        // Provider readable again and the queue is empty
        h.client.recover(af_03_scrapers::MockCall::ProviderQueue);
        h.client.set_queue(PROVIDER_ID, vec![]);
        h.provider_queue.scrape().await.unwrap();
        assert_eq!(h.store.attester(&network, &a).unwrap().state, AttesterState::Active);
    }
}
