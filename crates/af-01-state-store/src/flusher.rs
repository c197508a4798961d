//! # Debounced Flusher
//!
//! Coalesces bursts of flush requests for one network into a single write.
//!
//! ```text
//! schedule ──→ [window open] ──schedule──→ (coalesced)
//!                   │
//!                   ├── window elapsed ──→ write ──→ [idle]
//!                   │
//!                   └── flush_now ──→ cancel timer, write ──→ [idle]
//! ```
//!
//! The first request opens a window; requests arriving while it is open are
//! absorbed. The write happens once, when the window elapses, or immediately
//! when `flush_now` is called (shutdown).

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The write performed when a window closes.
pub type FlushAction = Arc<dyn Fn() + Send + Sync>;

/// Timer-owning flush coalescer for one network.
pub struct DebouncedFlusher {
    label: String,
    window: Duration,
    action: FlushAction,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
    scheduled: AtomicU64,
    flushes: Arc<AtomicU64>,
}

impl DebouncedFlusher {
    pub fn new(label: impl Into<String>, window: Duration, action: FlushAction) -> Self {
        Self {
            label: label.into(),
            window,
            action,
            pending: Arc::new(Mutex::new(None)),
            scheduled: AtomicU64::new(0),
            flushes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Request a flush.
    ///
    /// Returns `true` when this call opened a new window, `false` when it was
    /// absorbed by one already open. Outside a tokio runtime there is no timer
    /// to wait on, so the flush runs immediately.
    pub fn schedule_flush(&self) -> bool {
        let mut pending = self.pending.lock();
        if pending.is_some() {
            return false;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                drop(pending);
                warn!(
                    "[store] No async runtime for {} flush timer, writing immediately",
                    self.label
                );
                self.scheduled.fetch_add(1, Ordering::SeqCst);
                self.run_action();
                return true;
            }
        };

        let slot = Arc::clone(&self.pending);
        let action = Arc::clone(&self.action);
        let flushes = Arc::clone(&self.flushes);
        let window = self.window;
        let label = self.label.clone();

        *pending = Some(handle.spawn(async move {
            tokio::time::sleep(window).await;
            // An empty slot means flush_now already claimed this window.
            if slot.lock().take().is_none() {
                return;
            }
            debug!("[store] Debounce window for {} elapsed, flushing", label);
            action();
            flushes.fetch_add(1, Ordering::SeqCst);
        }));
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Cancel any open window and write synchronously.
    pub fn flush_now(&self) {
        if let Some(timer) = self.pending.lock().take() {
            timer.abort();
        }
        self.run_action();
    }

    /// Write synchronously only if a window is open. Returns whether a write happened.
    pub fn flush_pending(&self) -> bool {
        let Some(timer) = self.pending.lock().take() else {
            return false;
        };
        timer.abort();
        self.run_action();
        true
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Windows opened so far.
    pub fn scheduled_count(&self) -> u64 {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Writes performed so far.
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::SeqCst)
    }

    fn run_action(&self) {
        (self.action)();
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for DebouncedFlusher {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.lock().take() {
            timer.abort();
        }
    }
}
