//! # Scraper Isolation
//!
//! The four scrapers of one network on one orchestrator: a scraper whose
//! chain calls keep failing is counted and retried while the others stay on
//! schedule and keep the store current.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{addr, provider, PROVIDER_ID};
    use af_01_state_store::{
        AppliedConfig, AttesterOnChainView, AttesterState, ConfiguredAttester, OnChainStatus,
        StateStore,
    };
    use af_02_lifecycle::LifecycleEngine;
    use af_03_scrapers::{
        MockCall, MockChainClient, ProviderQueueScraper, PublisherBalanceScraper, RewardsScraper,
        RollupViewScraper, PUBLISHER_BALANCE_SCRAPER, REWARDS_SCRAPER, ROLLUP_VIEW_SCRAPER,
    };
    use af_04_orchestrator::{OrchestratorError, ScraperOrchestrator, ScraperStatsEntry};
    use shared_types::{NetworkName, ScraperErrorKind, U256};
    use std::sync::Arc;
    use std::time::Duration;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn network() -> NetworkName {
        NetworkName::new("isolation")
    }

    fn build(client: Arc<MockChainClient>, store: Arc<StateStore>) -> ScraperOrchestrator {
        let engine = Arc::new(LifecycleEngine::new(store.clone()));
        let mut orchestrator = ScraperOrchestrator::new();
        orchestrator
            .register(
                Arc::new(ProviderQueueScraper::new(
                    network(),
                    Some(PROVIDER_ID),
                    client.clone(),
                    store.clone(),
                    engine.clone(),
                )),
                INTERVAL,
            )
            .unwrap();
        orchestrator
            .register(
                Arc::new(
                    RollupViewScraper::new(network(), client.clone(), store.clone(), engine)
                        .with_provider_queue(true),
                ),
                INTERVAL,
            )
            .unwrap();
        orchestrator
            .register(
                Arc::new(PublisherBalanceScraper::new(
                    network(),
                    vec![addr(0xd1)],
                    U256::from(100u64),
                    client.clone(),
                    store.clone(),
                )),
                INTERVAL,
            )
            .unwrap();
        orchestrator
            .register(
                Arc::new(RewardsScraper::new(network(), 1_000, client, store)),
                INTERVAL,
            )
            .unwrap();
        orchestrator
    }

    fn stats_of<'a>(stats: &'a [ScraperStatsEntry], scraper: &str) -> &'a ScraperStatsEntry {
        stats.iter().find(|s| s.scraper == scraper).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_rewards_scraper_does_not_stall_lifecycle() {
        let client = Arc::new(MockChainClient::new());
        let store = Arc::new(StateStore::in_memory());
        let a = addr(0x0a);

        client.set_provider(PROVIDER_ID, provider(), vec![]);
        client.set_balance(addr(0xd1), U256::from(40u64));
        client.fail(MockCall::PendingRewards);
        store.set_applied_config(
            &network(),
            AppliedConfig {
                attesters: vec![ConfiguredAttester {
                    address: a,
                    coinbase: Some(addr(0xcb)),
                    last_known_state: None,
                }],
                applied_at: 0,
            },
        );
        store.update_attester_state(&network(), &a, AttesterState::New);

        let orchestrator = build(client.clone(), store.clone());
        orchestrator.init().await.unwrap();
        orchestrator.start().await.unwrap();

        // Warm-up ran every scraper once
        let stats = orchestrator.stats();
        assert_eq!(stats_of(&stats, REWARDS_SCRAPER).stats.failures, 1);
        assert_eq!(store.attester(&network(), &a).unwrap().state, AttesterState::New);

        // The attester starts validating while rewards keep failing
        client.set_view(
            a,
            Some(AttesterOnChainView::new(OnChainStatus::Validating, U256::one())),
        );
        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

        assert_eq!(store.attester(&network(), &a).unwrap().state, AttesterState::Active);
        let stats = orchestrator.stats();
        let rewards = stats_of(&stats, REWARDS_SCRAPER);
        assert!(rewards.stats.runs >= 2);
        assert_eq!(rewards.stats.failures, rewards.stats.runs);
        assert!(rewards.stats.last_success_ms.is_none());

        for healthy in [ROLLUP_VIEW_SCRAPER, PUBLISHER_BALANCE_SCRAPER] {
            let entry = stats_of(&stats, healthy);
            assert!(entry.stats.runs >= 2, "{} ran {}", healthy, entry.stats.runs);
            assert_eq!(entry.stats.failures, 0);
        }
        assert_eq!(
            store.publisher_balances(&network())[&addr(0xd1)].required_top_up,
            U256::from(60u64)
        );

        // Recovery is picked up on the next tick
        client.recover(MockCall::PendingRewards);
        client.set_pending_rewards(addr(0xcb), U256::from(500u64));
        client.set_block_number(10);
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(store.rewards_history(&network()).len(), 1);

        assert!(orchestrator.shutdown().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_chain_fails_setup() {
        let client = Arc::new(MockChainClient::new());
        client.fail(MockCall::CheckConnection);
        let orchestrator = build(client, Arc::new(StateStore::in_memory()));

        match orchestrator.init().await {
            Err(OrchestratorError::Setup(e)) => assert_eq!(e.kind, ScraperErrorKind::Setup),
            other => panic!("unexpected init result: {:?}", other),
        }
    }
}
