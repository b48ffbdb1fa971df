//! Pool registry: a process-wide table keyed by pool name, used only by
//! the introspection surface. Never consulted by the dispatch loop
//! itself — reads here are best-effort snapshots.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::error::QueueError;

/// Counts a manager can report about itself, queried through its
/// message channel (so this is always a consistent snapshot, never a
/// torn read of manager-owned state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerCounts {
    /// Workers currently idle.
    pub idle: usize,
    /// All workers currently known to the manager (idle + busy).
    pub known: usize,
    /// Work items waiting for a worker.
    pub pending: usize,
}

/// The narrow interface the registry needs from a manager to answer
/// introspection queries. Implemented by [`crate::handle::ManagerHandle`]
/// for any payload/response types, type-erased here so pools of
/// different payload types can share one registry.
#[async_trait]
pub trait Introspectable: Send + Sync {
    async fn counts(&self) -> ManagerCounts;
}

struct Entry {
    born: Instant,
    introspect: Arc<dyn Introspectable>,
}

static REGISTRY: Lazy<DashMap<String, Entry>> = Lazy::new(DashMap::new);

/// Register a pool under `name`. Replacing an existing registration
/// under the same name is allowed (logged at `warn`) — this is an
/// introspection convenience, not a uniqueness-enforcing namespace.
pub fn register_pool(name: impl Into<String>, born: Instant, introspect: Arc<dyn Introspectable>) {
    let name = name.into();
    if REGISTRY.contains_key(&name) {
        log::warn!(target: "queue_core::registry", "replacing existing pool registration: {name}");
    }
    REGISTRY.insert(name, Entry { born, introspect });
}

/// Remove a pool's registration, typically called from its termination
/// path.
pub fn unregister_pool(name: &str) {
    REGISTRY.remove(name);
}

/// Derived stats for one pool: `busy = size - idle`, `age_secs` from
/// the pool's birth timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub size: usize,
    pub idle: usize,
    pub busy: usize,
    pub pending: usize,
    pub age_secs: u64,
}

pub async fn pool_stats(name: &str) -> Result<PoolStats, QueueError> {
    let (born, introspect) = {
        let entry = REGISTRY
            .get(name)
            .ok_or_else(|| QueueError::InvalidPool(name.to_string()))?;
        (entry.born, entry.introspect.clone())
    };
    // The DashMap guard is dropped before awaiting so we never hold a
    // shard lock across a manager round trip.
    let counts = introspect.counts().await;
    Ok(PoolStats {
        size: counts.known,
        idle: counts.idle,
        busy: counts.known.saturating_sub(counts.idle),
        pending: counts.pending,
        age_secs: born.elapsed().as_secs(),
    })
}

/// One line of the pool listing.
#[derive(Debug, Clone)]
pub struct PoolSummary {
    pub name: String,
}

pub fn list_pools() -> Vec<PoolSummary> {
    REGISTRY
        .iter()
        .map(|entry| PoolSummary {
            name: entry.key().clone(),
        })
        .collect()
}
