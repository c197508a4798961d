//! Read-only view of the state store in Prometheus form.
//!
//! Gauges mirror the store at render time. They are reset first so entries
//! that disappeared from the store (a failed provider scrape, a pruned
//! coinbase) disappear from the output too.

use af_01_state_store::StateStore;
use parking_lot::Mutex;
use shared_types::{u256_to_f64, NetworkName};

use crate::metrics::{
    encode_metrics, register_metrics, ATTESTERS, PROVIDER_QUEUE_LENGTH,
    PROVIDER_SNAPSHOT_TIMESTAMP, PUBLISHER_BALANCE, PUBLISHER_OBSERVED_TIMESTAMP,
    PUBLISHER_REQUIRED_TOP_UP, REWARDS_OTHER_SHARE, REWARDS_OUR_SHARE, REWARDS_PENDING,
    REWARDS_SNAPSHOT_TIMESTAMP,
};
use crate::TelemetryError;

/// Serialises reset-fill-encode so concurrent renders never see half-filled gauges.
static RENDER_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Exposes store contents as metrics.
pub struct MetricsFacade;

impl MetricsFacade {
    /// Refresh every gauge from `store` and encode the whole registry.
    pub fn render(store: &StateStore) -> Result<String, TelemetryError> {
        let _guard = RENDER_LOCK.lock();
        register_metrics()?;
        reset_gauges();
        for network in store.networks() {
            fill_network(store, &network);
        }
        encode_metrics()
    }
}

fn reset_gauges() {
    ATTESTERS.reset();
    PROVIDER_QUEUE_LENGTH.reset();
    PROVIDER_SNAPSHOT_TIMESTAMP.reset();
    PUBLISHER_BALANCE.reset();
    PUBLISHER_REQUIRED_TOP_UP.reset();
    PUBLISHER_OBSERVED_TIMESTAMP.reset();
    REWARDS_PENDING.reset();
    REWARDS_OUR_SHARE.reset();
    REWARDS_OTHER_SHARE.reset();
    REWARDS_SNAPSHOT_TIMESTAMP.reset();
}

fn fill_network(store: &StateStore, network: &NetworkName) {
    let Some(state) = store.network_state(network) else {
        return;
    };
    let net = network.as_str();

    for (lifecycle, count) in state.attester_counts() {
        ATTESTERS
            .with_label_values(&[net, lifecycle.as_str()])
            .set(count as f64);
    }

    if let Some(snapshot) = &state.staking_provider_snapshot {
        PROVIDER_QUEUE_LENGTH
            .with_label_values(&[net])
            .set(snapshot.queue_length as f64);
        PROVIDER_SNAPSHOT_TIMESTAMP
            .with_label_values(&[net])
            .set(snapshot.observed_at as f64);
    }

    for (publisher, balance) in &state.publisher_balances {
        let publisher = publisher.to_string();
        let labels = [net, publisher.as_str()];
        PUBLISHER_BALANCE
            .with_label_values(&labels)
            .set(u256_to_f64(balance.current_balance));
        PUBLISHER_REQUIRED_TOP_UP
            .with_label_values(&labels)
            .set(u256_to_f64(balance.required_top_up));
        PUBLISHER_OBSERVED_TIMESTAMP
            .with_label_values(&labels)
            .set(balance.observed_at as f64);
    }

    for (coinbase, snapshot) in state.latest_rewards() {
        let coinbase = coinbase.to_string();
        let labels = [net, coinbase.as_str()];
        REWARDS_PENDING
            .with_label_values(&labels)
            .set(u256_to_f64(snapshot.pending_rewards));
        REWARDS_OUR_SHARE
            .with_label_values(&labels)
            .set(u256_to_f64(snapshot.our_share));
        REWARDS_OTHER_SHARE
            .with_label_values(&labels)
            .set(u256_to_f64(snapshot.other_share));
        REWARDS_SNAPSHOT_TIMESTAMP
            .with_label_values(&labels)
            .set(snapshot.timestamp as f64);
    }
}
