//! Error taxonomy for the dispatch core: a plain, `thiserror`-derived
//! enum covering everything a submitter or introspection caller can
//! observe from outside the manager task.

use thiserror::Error;

/// Errors a submitter or an introspection caller can observe.
///
/// The manager itself never panics or crashes in response to any of
/// these conditions — they are all handled at the matching boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The submitter's local wait elapsed before a worker replied.
    #[error("timed out waiting for a worker")]
    Timeout,

    /// The queue manager is not running (its message channel is closed).
    #[error("queue manager is not running")]
    NoProc,

    /// The manager shut down while this call was queued or in flight.
    #[error("queue shut down: {reason}")]
    QueueShutdown { reason: String },

    /// Introspection was asked about a pool name nobody registered.
    #[error("unknown pool: {0}")]
    InvalidPool(String),
}
