//! The public submission surface: a cheap, `Clone`-able handle to a
//! running pool's dispatch loop.
//!
//! Every operation here is message-passing against the single manager
//! task in `manager.rs` — nothing in this module touches worker or
//! pending-queue state directly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::manager::{Manager, ManagerMessage};
use crate::registry::{self, Introspectable, ManagerCounts};
use crate::reply::ReplyTo;
use crate::tracer::{LatencySnapshot, LatencyTracer};
use crate::worker::WorkerHandle;
use crate::worker_id::WorkerId;

/// A handle to one running pool. Cloning is cheap (an `mpsc::Sender`
/// clone); every clone talks to the same dispatch loop.
#[derive(Clone)]
pub struct ManagerHandle<Req, Resp> {
    pool_name: Arc<str>,
    tx: mpsc::Sender<ManagerMessage<Req, Resp>>,
    default_timeout: Option<Duration>,
    tracer: Option<LatencyTracer>,
}

impl<Req, Resp> ManagerHandle<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Spawn a pool's dispatch loop as a `tokio::task` and register it
    /// for introspection under `pool_name`. Registering under a name
    /// already in use replaces the prior registration (logged at
    /// `warn` by the registry).
    pub fn spawn(pool_name: impl Into<String>, config: QueueConfig) -> Self {
        let pool_name: Arc<str> = Arc::from(pool_name.into());
        let (tx, rx) = mpsc::channel(config.channel_capacity);

        let manager = Manager::new(pool_name.to_string(), rx);
        tokio::spawn(manager.run());

        let tracer = config
            .latency_window
            .map(|window| LatencyTracer::spawn(window, None));

        let handle = Self {
            pool_name,
            tx,
            default_timeout: config.default_timeout,
            tracer,
        };

        registry::register_pool(
            handle.pool_name.to_string(),
            Instant::now(),
            Arc::new(handle.clone()) as Arc<dyn Introspectable>,
        );

        handle
    }

    pub fn pool_name(&self) -> &str {
        &self.pool_name
    }

    /// Register a worker and immediately mark it ready, exactly as if
    /// `worker_ready` had been called right after.
    pub async fn new_worker(&self, id: WorkerId, worker: WorkerHandle<Req, Resp>) {
        let _ = self.tx.send(ManagerMessage::NewWorker { id, handle: worker }).await;
    }

    pub async fn worker_ready(&self, id: WorkerId) {
        let _ = self.tx.send(ManagerMessage::WorkerReady { id }).await;
    }

    pub async fn worker_busy(&self, id: WorkerId) {
        let _ = self.tx.send(ManagerMessage::WorkerBusy { id }).await;
    }

    pub async fn worker_dead(&self, id: WorkerId) {
        let _ = self.tx.send(ManagerMessage::WorkerDead { id }).await;
    }

    /// Fire-and-forget submission. Returns [`QueueError::NoProc`] only
    /// if the manager task is already gone; a cast accepted by the
    /// channel is never otherwise reported back as failed.
    pub async fn cast(&self, payload: Req) -> Result<(), QueueError> {
        self.tx
            .send(ManagerMessage::Cast { payload })
            .await
            .map_err(|_| QueueError::NoProc)
    }

    /// Fire-and-forget event submission for state-machine workers.
    pub async fn send_event(&self, payload: Req, all_state: bool) -> Result<(), QueueError> {
        self.tx
            .send(ManagerMessage::Event { payload, all_state })
            .await
            .map_err(|_| QueueError::NoProc)
    }

    /// Synchronous call. `timeout` overrides the pool's
    /// [`QueueConfig::default_timeout`] for this one submission; pass
    /// `Some(Duration::ZERO)`-like values only if you mean an
    /// immediately-expiring deadline.
    pub async fn call(&self, payload: Req, timeout: Option<Duration>) -> Result<Resp, QueueError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let client = ReplyTo::new(reply_tx);
        let effective_timeout = timeout.or(self.default_timeout);
        let started = Instant::now();

        self.tx
            .send(ManagerMessage::Call {
                payload,
                timeout: effective_timeout,
                client,
            })
            .await
            .map_err(|_| QueueError::NoProc)?;

        let result = self.await_reply(reply_rx, effective_timeout).await;
        if let Some(tracer) = &self.tracer {
            tracer.record(started.elapsed());
        }
        result
    }

    /// Synchronous event delivery for state-machine workers.
    pub async fn sync_event(
        &self,
        payload: Req,
        all_state: bool,
        timeout: Option<Duration>,
    ) -> Result<Resp, QueueError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let client = ReplyTo::new(reply_tx);
        let effective_timeout = timeout.or(self.default_timeout);
        let started = Instant::now();

        self.tx
            .send(ManagerMessage::SyncEvent {
                payload,
                timeout: effective_timeout,
                all_state,
                client,
            })
            .await
            .map_err(|_| QueueError::NoProc)?;

        let result = self.await_reply(reply_rx, effective_timeout).await;
        if let Some(tracer) = &self.tracer {
            tracer.record(started.elapsed());
        }
        result
    }

    async fn await_reply(
        &self,
        reply_rx: oneshot::Receiver<Result<Resp, QueueError>>,
        timeout: Option<Duration>,
    ) -> Result<Resp, QueueError> {
        match timeout {
            None => reply_rx.await.map_err(|_| QueueError::NoProc)?,
            Some(timeout) => match tokio::time::timeout(timeout, reply_rx).await {
                Ok(received) => received.map_err(|_| QueueError::NoProc)?,
                Err(_) => Err(QueueError::Timeout),
            },
        }
    }

    /// The most recently closed latency window, if tracing is enabled
    /// for this pool (see [`QueueConfig::latency_window`]).
    pub fn latency_snapshot(&self) -> Option<LatencySnapshot> {
        self.tracer.as_ref().map(|t| t.last_window())
    }

    pub async fn counts(&self) -> Result<ManagerCounts, QueueError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ManagerMessage::Counts { reply })
            .await
            .map_err(|_| QueueError::NoProc)?;
        rx.await.map_err(|_| QueueError::NoProc)
    }

    /// Ask the dispatch loop to drain and stop. Unregisters the pool
    /// from the registry so it no longer shows up in introspection.
    pub async fn shutdown(&self, reason: impl Into<String>) {
        let _ = self
            .tx
            .send(ManagerMessage::Shutdown {
                reason: reason.into(),
            })
            .await;
        registry::unregister_pool(&self.pool_name);
    }
}

#[async_trait]
impl<Req, Resp> Introspectable for ManagerHandle<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn counts(&self) -> ManagerCounts {
        ManagerHandle::counts(self).await.unwrap_or(ManagerCounts {
            idle: 0,
            known: 0,
            pending: 0,
        })
    }
}
