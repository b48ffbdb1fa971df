//! Latency tracing: a time-bounded background observer that folds
//! per-request latency samples into rolling window snapshots.
//!
//! Plain atomic running counters swapped out on a timer, rather than a
//! histogram library — cheap and lock-light enough to sit on every
//! `call`/`sync_event` round trip without becoming the bottleneck.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

/// A folded view of the samples recorded in one completed window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencySnapshot {
    pub count: u64,
    pub mean_micros: u64,
    pub max_micros: u64,
}

struct Counters {
    count: AtomicU64,
    sum_micros: AtomicU64,
    max_micros: AtomicU64,
}

impl Counters {
    fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum_micros: AtomicU64::new(0),
            max_micros: AtomicU64::new(0),
        }
    }

    fn record(&self, micros: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_micros.fetch_add(micros, Ordering::Relaxed);
        self.max_micros.fetch_max(micros, Ordering::Relaxed);
    }

    /// Atomically read and reset, producing the snapshot for the window
    /// that just closed.
    fn take(&self) -> LatencySnapshot {
        let count = self.count.swap(0, Ordering::Relaxed);
        let sum = self.sum_micros.swap(0, Ordering::Relaxed);
        let max = self.max_micros.swap(0, Ordering::Relaxed);
        LatencySnapshot {
            count,
            mean_micros: if count == 0 { 0 } else { sum / count },
            max_micros: max,
        }
    }
}

/// Records latency samples and rolls them into a snapshot of the most
/// recently completed window. The background task that performs the
/// roll stops itself after `lifetime`, if one was given — this is
/// meant for bounded diagnostic runs, not a permanent metrics pipeline.
#[derive(Clone)]
pub struct LatencyTracer {
    counters: Arc<Counters>,
    last_window: Arc<Mutex<LatencySnapshot>>,
}

impl LatencyTracer {
    /// Spawn the background roll-over task and return a handle.
    /// `window` is how often samples are folded into `last_window`;
    /// `lifetime`, if set, bounds how long the background task keeps
    /// running before it exits on its own.
    pub fn spawn(window: Duration, lifetime: Option<Duration>) -> Self {
        let counters = Arc::new(Counters::new());
        let last_window = Arc::new(Mutex::new(LatencySnapshot::default()));

        let bg_counters = counters.clone();
        let bg_last_window = last_window.clone();
        tokio::spawn(async move {
            let start = Instant::now();
            let mut ticker = tokio::time::interval(window);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let snapshot = bg_counters.take();
                *bg_last_window.lock().expect("latency tracer mutex poisoned") = snapshot;
                if let Some(lifetime) = lifetime {
                    if start.elapsed() >= lifetime {
                        return;
                    }
                }
            }
        });

        Self {
            counters,
            last_window,
        }
    }

    pub fn record(&self, sample: Duration) {
        self.counters.record(sample.as_micros() as u64);
    }

    /// The snapshot folded at the end of the most recently completed
    /// window. Empty (`count == 0`) until the first window closes.
    pub fn last_window(&self) -> LatencySnapshot {
        *self.last_window.lock().expect("latency tracer mutex poisoned")
    }
}
