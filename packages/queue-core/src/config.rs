//! Tunables for spawning a pool: a small, all-`Copy` struct with a
//! conservative `Default`, passed once at spawn time.

use std::time::Duration;

/// Configuration for one [`crate::handle::ManagerHandle::spawn`] call.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// Bound on the manager's message channel. Submitters block on
    /// `.send().await` once it's full; there is no `try_send` failure
    /// surfaced to callers on this path — only the manager's sends to
    /// individual workers use `try_send`, treating a full or closed
    /// worker mailbox as a dead worker.
    pub channel_capacity: usize,
    /// Default deadline applied to `call`/`sync_event` submissions that
    /// don't specify their own timeout. `None` means
    /// [`crate::clock::INFINITE`].
    pub default_timeout: Option<Duration>,
    /// Window size for the pool's [`crate::tracer::LatencyTracer`].
    /// `None` disables latency tracing for this pool entirely.
    pub latency_window: Option<Duration>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            default_timeout: Some(Duration::from_secs(30)),
            latency_window: Some(Duration::from_secs(60)),
        }
    }
}
