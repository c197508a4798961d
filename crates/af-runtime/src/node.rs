//! # Node Wiring
//!
//! ## Startup Sequence
//!
//! 1. Create the state store over `<data_dir>` and attach the metrics recorder
//! 2. Per network: load the roster, bootstrap, build engine, client and scrapers
//! 3. Per network: `init()` then `start()` its orchestrator
//! 4. Serve `/metrics` and `/health`
//!
//! A network whose setup fails is logged and left out; the others keep running.

use crate::config::{NetworkConfig, RuntimeConfig};
use crate::error::RuntimeResult;
use crate::http::{router, HttpState};
use af_01_state_store::{JsonFilePersistence, StateStore, StoreConfig};
use af_02_lifecycle::{load_roster, LifecycleEngine, NetworkBootstrapper, ReconciliationReport};
use af_03_scrapers::{
    DynChainClient, FileChainClient, ProviderQueueScraper, PublisherBalanceScraper,
    RewardsScraper, RollupViewScraper,
};
use af_04_orchestrator::ScraperOrchestrator;
use af_telemetry::MetricsRecorder;
use shared_types::NetworkName;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// One bootstrapped network and its scrapers.
pub struct NetworkRuntime {
    pub name: NetworkName,
    pub report: ReconciliationReport,
    pub orchestrator: Arc<ScraperOrchestrator>,
}

/// The running monitor: store, per-network orchestrators, metrics server.
pub struct AfNode {
    config: RuntimeConfig,
    store: Arc<StateStore>,
    networks: Vec<NetworkRuntime>,
    shutdown_tx: watch::Sender<bool>,
    server: Option<JoinHandle<std::io::Result<()>>>,
}

impl AfNode {
    /// Bootstrap every configured network. Nothing is scheduled yet.
    pub fn build(config: RuntimeConfig) -> RuntimeResult<Self> {
        let persistence = Arc::new(JsonFilePersistence::new(&config.data_dir));
        let store = Arc::new(StateStore::new(
            StoreConfig {
                flush_debounce: config.flush_debounce(),
            },
            Some(persistence),
        ));
        let recorder = Arc::new(MetricsRecorder::new()?);
        store.add_listener(recorder.clone());

        let mut networks = Vec::with_capacity(config.networks.len());
        for network_config in &config.networks {
            match build_network(&store, &recorder, network_config) {
                Ok(runtime) => networks.push(runtime),
                Err(e) => error!(
                    network = %network_config.name,
                    error = %e,
                    "Network setup failed, not monitoring it"
                ),
            }
        }

        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            config,
            store,
            networks,
            shutdown_tx,
            server: None,
        })
    }

    /// Initialise and start each network's scrapers.
    ///
    /// A network whose setup hook fails is dropped. Returns how many run.
    pub async fn start(&mut self) -> usize {
        let mut running = Vec::with_capacity(self.networks.len());
        for network in std::mem::take(&mut self.networks) {
            if let Err(e) = network.orchestrator.init().await {
                error!(network = %network.name, error = %e, "Scrapers failed to initialise, not monitoring network");
                continue;
            }
            if let Err(e) = network.orchestrator.start().await {
                error!(network = %network.name, error = %e, "Scrapers failed to start");
                network.orchestrator.shutdown().await;
                continue;
            }
            running.push(network);
        }
        self.networks = running;
        info!(networks = self.networks.len(), "Monitoring started");
        self.networks.len()
    }

    /// Bind the metrics endpoint on `metrics_port` (all interfaces).
    pub async fn serve_metrics(&mut self) -> RuntimeResult<SocketAddr> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.metrics_port));
        let listener = TcpListener::bind(addr).await?;
        self.serve_on(listener)
    }

    /// Serve `/metrics` and `/health` on an already bound listener.
    pub fn serve_on(&mut self, listener: TcpListener) -> RuntimeResult<SocketAddr> {
        let local_addr = listener.local_addr()?;
        let app = router(HttpState {
            store: Arc::clone(&self.store),
            orchestrators: Arc::new(
                self.networks
                    .iter()
                    .map(|network| Arc::clone(&network.orchestrator))
                    .collect(),
            ),
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        info!(addr = %local_addr, "Starting metrics server");
        self.server = Some(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
        }));
        Ok(local_addr)
    }

    pub fn store(&self) -> Arc<StateStore> {
        Arc::clone(&self.store)
    }

    pub fn networks(&self) -> &[NetworkRuntime] {
        &self.networks
    }

    /// Stop scrapers, stop the server, then write every pending flush.
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");

        for network in &self.networks {
            let teardown_errors = network.orchestrator.shutdown().await;
            if !teardown_errors.is_empty() {
                warn!(network = %network.name, errors = teardown_errors.len(), "Scraper teardown reported errors");
            }
        }

        let _ = self.shutdown_tx.send(true);
        if let Some(server) = self.server.take() {
            match server.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Metrics server error"),
                Err(e) => error!(error = %e, "Metrics server task ended abnormally"),
            }
        }

        let flushed = self.store.shutdown();
        info!(flushed, "Shutdown complete");
    }
}

fn build_network(
    store: &Arc<StateStore>,
    recorder: &Arc<MetricsRecorder>,
    config: &NetworkConfig,
) -> RuntimeResult<NetworkRuntime> {
    let name = config.network_name();
    let min_publisher_balance = config.min_publisher_balance()?;

    let roster = load_roster(&config.attesters_path)?;
    let report = NetworkBootstrapper::new(Arc::clone(store)).bootstrap(&name, roster)?;

    let engine = Arc::new(LifecycleEngine::new(Arc::clone(store)));
    engine.add_alert_sink(recorder.clone());

    let client: DynChainClient = Arc::new(FileChainClient::new(&config.chain_snapshot_path));

    let mut orchestrator = ScraperOrchestrator::new();
    orchestrator.add_observer(recorder.clone())?;
    orchestrator.register(
        Arc::new(ProviderQueueScraper::new(
            name.clone(),
            config.provider_id,
            Arc::clone(&client),
            Arc::clone(store),
            Arc::clone(&engine),
        )),
        Duration::from_secs(config.provider_queue_interval_secs),
    )?;
    orchestrator.register(
        Arc::new(
            RollupViewScraper::new(
                name.clone(),
                Arc::clone(&client),
                Arc::clone(store),
                Arc::clone(&engine),
            )
            .with_provider_queue(config.provider_id.is_some()),
        ),
        Duration::from_secs(config.rollup_view_interval_secs),
    )?;
    orchestrator.register(
        Arc::new(PublisherBalanceScraper::new(
            name.clone(),
            config.publishers.clone(),
            min_publisher_balance,
            Arc::clone(&client),
            Arc::clone(store),
        )),
        Duration::from_secs(config.publisher_balance_interval_secs),
    )?;
    orchestrator.register(
        Arc::new(RewardsScraper::new(
            name.clone(),
            config.provider_take_rate_bps,
            client,
            Arc::clone(store),
        )),
        Duration::from_secs(config.rewards_interval_secs),
    )?;

    info!(
        network = %name,
        created = report.created,
        advanced = report.advanced,
        unchanged = report.unchanged,
        "Network bootstrapped"
    );
    Ok(NetworkRuntime {
        name,
        report,
        orchestrator: Arc::new(orchestrator),
    })
}
