//! # Scraper Orchestrator
//!
//! Owns the registered scrapers and their timers.
//!
//! ```text
//! [Registered] ──init()──→ [Initialised] ──start()──→ [Running] ──shutdown()──→ [Stopped]
//!       │                        │
//!       └── setup error ─────────┴──→ init() returns Err, nothing is scheduled
//! ```
//!
//! Every scraper gets its own task: one warm-up run during `start()`, then a
//! run per interval tick. A run's error or panic is logged and counted, never
//! propagated, so one failing scraper cannot stall another.

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::ports::{ScrapeObserver, ScrapeOutcome};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use shared_types::{now_millis, DynScraper, NetworkName, ScraperError, TimestampMs};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Lifecycle phase of the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Registered,
    Initialised,
    Running,
    Stopped,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Registered => "registered",
            Phase::Initialised => "initialised",
            Phase::Running => "running",
            Phase::Stopped => "stopped",
        }
    }
}

/// Per-scraper run statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScraperStats {
    pub runs: u64,
    pub failures: u64,
    pub last_success_ms: Option<TimestampMs>,
    pub last_error: Option<String>,
}

/// Statistics of one registered scraper, as returned by `stats()`.
#[derive(Clone, Debug, Serialize)]
pub struct ScraperStatsEntry {
    pub network: NetworkName,
    pub scraper: String,
    pub interval_secs: u64,
    #[serde(flatten)]
    pub stats: ScraperStats,
}

struct ScraperEntry {
    scraper: DynScraper,
    interval: Duration,
    stats: Mutex<ScraperStats>,
}

impl ScraperEntry {
    /// One run, with its error swallowed after logging.
    async fn run_once(&self, observers: &[Arc<dyn ScrapeObserver>]) {
        let network = self.scraper.network();
        let name = self.scraper.name();
        let started = Instant::now();

        let result = match AssertUnwindSafe(self.scraper.scrape()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(ScraperError::scrape(
                name,
                network,
                format!("scrape panicked: {}", panic_message(panic.as_ref())),
            )),
        };

        let outcome = match result {
            Ok(()) => {
                let mut stats = self.stats.lock();
                stats.runs += 1;
                stats.last_success_ms = Some(now_millis());
                stats.last_error = None;
                debug!(network = %network, scraper = name, "[orchestrator] Scrape succeeded");
                ScrapeOutcome::Success
            }
            Err(e) => {
                let mut stats = self.stats.lock();
                stats.runs += 1;
                stats.failures += 1;
                stats.last_error = Some(e.to_string());
                warn!(network = %network, scraper = name, error = %e, "[orchestrator] Scrape failed");
                ScrapeOutcome::Failure
            }
        };

        let elapsed = started.elapsed();
        for observer in observers {
            observer.on_scrape(network, name, outcome, elapsed);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Schedules registered scrapers and isolates their failures.
pub struct ScraperOrchestrator {
    entries: Vec<Arc<ScraperEntry>>,
    observers: Arc<Vec<Arc<dyn ScrapeObserver>>>,
    phase: Mutex<Phase>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ScraperOrchestrator {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            entries: Vec::new(),
            observers: Arc::new(Vec::new()),
            phase: Mutex::new(Phase::Registered),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Queue a scraper for one network. Scrapers run in registration order
    /// during `init()` and the warm-up pass.
    pub fn register(&mut self, scraper: DynScraper, interval: Duration) -> OrchestratorResult<()> {
        self.expect_phase(Phase::Registered)?;
        if interval.is_zero() {
            return Err(OrchestratorError::InvalidInterval {
                scraper: scraper.name().to_string(),
                network: scraper.network().to_string(),
            });
        }

        info!(
            network = %scraper.network(),
            scraper = scraper.name(),
            interval_secs = interval.as_secs(),
            "[orchestrator] Registering scraper"
        );
        self.entries.push(Arc::new(ScraperEntry {
            scraper,
            interval,
            stats: Mutex::new(ScraperStats::default()),
        }));
        Ok(())
    }

    /// Add an observer notified after every run. Only before `start()`.
    pub fn add_observer(&mut self, observer: Arc<dyn ScrapeObserver>) -> OrchestratorResult<()> {
        self.expect_phase(Phase::Registered)?;
        Arc::make_mut(&mut self.observers).push(observer);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Run every scraper's setup hook, in order. The first failure aborts.
    pub async fn init(&self) -> OrchestratorResult<()> {
        self.expect_phase(Phase::Registered)?;
        info!("[orchestrator] Initialising {} scrapers", self.entries.len());

        for entry in &self.entries {
            let scraper = &entry.scraper;
            if let Err(e) = scraper.init().await {
                error!(
                    network = %scraper.network(),
                    scraper = scraper.name(),
                    error = %e,
                    "[orchestrator] ✗ Scraper setup failed"
                );
                return Err(OrchestratorError::Setup(e));
            }
            info!(network = %scraper.network(), scraper = scraper.name(), "[orchestrator] ✓ Scraper ready");
        }

        *self.phase.lock() = Phase::Initialised;
        Ok(())
    }

    /// Warm up each scraper with one run, then schedule it on its interval.
    pub async fn start(&self) -> OrchestratorResult<()> {
        self.expect_phase(Phase::Initialised)?;

        for entry in &self.entries {
            entry.run_once(&self.observers).await;

            let entry = Arc::clone(entry);
            let observers = Arc::clone(&self.observers);
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            let handle = tokio::spawn(async move {
                let first_tick = tokio::time::Instant::now() + entry.interval;
                let mut ticker = tokio::time::interval_at(first_tick, entry.interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => entry.run_once(&observers).await,
                        _ = shutdown_rx.changed() => break,
                    }
                }
                debug!(
                    network = %entry.scraper.network(),
                    scraper = entry.scraper.name(),
                    "[orchestrator] Timer stopped"
                );
            });
            self.tasks.lock().push(handle);
        }

        *self.phase.lock() = Phase::Running;
        info!("[orchestrator] {} scrapers running", self.entries.len());
        Ok(())
    }

    /// Cancel all timers, then run every teardown hook.
    ///
    /// In-flight runs finish first. Teardown errors are logged and returned,
    /// never raised.
    pub async fn shutdown(&self) -> Vec<ScraperError> {
        {
            let mut phase = self.phase.lock();
            if *phase == Phase::Stopped {
                return Vec::new();
            }
            *phase = Phase::Stopped;
        }
        info!("[orchestrator] Shutting down");

        let _ = self.shutdown_tx.send(true);
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "[orchestrator] Scraper task ended abnormally");
            }
        }

        let mut errors = Vec::new();
        for entry in &self.entries {
            if let Err(e) = entry.scraper.shutdown().await {
                warn!(
                    network = %entry.scraper.network(),
                    scraper = entry.scraper.name(),
                    error = %e,
                    "[orchestrator] Scraper teardown failed"
                );
                errors.push(e);
            }
        }

        info!(teardown_errors = errors.len(), "[orchestrator] Stopped");
        errors
    }

    /// Statistics per registered scraper, in registration order.
    pub fn stats(&self) -> Vec<ScraperStatsEntry> {
        self.entries
            .iter()
            .map(|entry| ScraperStatsEntry {
                network: entry.scraper.network().clone(),
                scraper: entry.scraper.name().to_string(),
                interval_secs: entry.interval.as_secs(),
                stats: entry.stats.lock().clone(),
            })
            .collect()
    }

    fn expect_phase(&self, expected: Phase) -> OrchestratorResult<()> {
        let actual = *self.phase.lock();
        if actual != expected {
            return Err(OrchestratorError::InvalidPhase {
                expected: expected.as_str(),
                actual: actual.as_str(),
            });
        }
        Ok(())
    }
}

impl Default for ScraperOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
