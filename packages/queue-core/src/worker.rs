//! The worker-side of the broker: the command shape a worker's mailbox
//! receives, the handle the manager uses to reach a registered worker,
//! and a minimal worker loop good enough to exercise the broker
//! end-to-end.
//!
//! Worker spawning, supervision, and real work execution are the
//! caller's responsibility; this module only defines the narrow
//! interface the dispatch loop needs.

use tokio::sync::mpsc;

use crate::handle::ManagerHandle;
use crate::reply::ReplyTo;
use crate::worker_id::WorkerId;

/// A command handed off to a worker's mailbox: a cast, a synchronous
/// call, or a state-machine event in either fire-and-forget or
/// synchronous form.
#[derive(Debug)]
pub enum WorkerCommand<Req, Resp> {
    Cast(Req),
    Call { client: ReplyTo<Resp>, payload: Req },
    Event { payload: Req, all_state: bool },
    SyncEvent {
        client: ReplyTo<Resp>,
        payload: Req,
        all_state: bool,
    },
}

/// A handle the manager uses to reach one registered worker.
///
/// Sending to a worker is fire-and-forget from the manager's point of
/// view: if the worker's mailbox has gone away, the send is silently
/// dropped and bookkeeping catches up later via an explicit
/// `worker_dead` notification.
#[derive(Debug, Clone)]
pub struct WorkerHandle<Req, Resp> {
    id: WorkerId,
    sender: mpsc::Sender<WorkerCommand<Req, Resp>>,
}

impl<Req, Resp> WorkerHandle<Req, Resp> {
    pub fn new(id: WorkerId, sender: mpsc::Sender<WorkerCommand<Req, Resp>>) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Best-effort send. Returns `false` if the worker's mailbox is
    /// gone; callers treat that the same as a dropped cast.
    pub fn send(&self, command: WorkerCommand<Req, Resp>) -> bool {
        self.sender.try_send(command).is_ok()
    }
}

/// The behavior a demo worker runs for each payload it's handed.
///
/// Implemented for any `FnMut(Req) -> Resp`, so a closure is enough to
/// stand a worker up; implement it directly for anything that needs
/// to hold onto state across calls.
pub trait Worker<Req, Resp> {
    fn handle(&mut self, payload: Req) -> Resp;
}

impl<Req, Resp, F> Worker<Req, Resp> for F
where
    F: FnMut(Req) -> Resp,
{
    fn handle(&mut self, payload: Req) -> Resp {
        self(payload)
    }
}

/// A minimal worker loop: owns its mailbox, processes one command at a
/// time, and reports its own readiness back to `manager` after each
/// one. Good enough to demo and test the broker; real work execution
/// is the caller's responsibility.
pub async fn spawn_demo_worker<Req, Resp, W>(
    manager: ManagerHandle<Req, Resp>,
    id: WorkerId,
    mut mailbox: mpsc::Receiver<WorkerCommand<Req, Resp>>,
    mut worker: W,
) where
    Req: Send + 'static,
    Resp: Send + 'static,
    W: Worker<Req, Resp>,
{
    while let Some(command) = mailbox.recv().await {
        match command {
            WorkerCommand::Cast(payload) => {
                let _ = worker.handle(payload);
            }
            WorkerCommand::Call { client, payload } => {
                client.reply(Ok(worker.handle(payload)));
            }
            WorkerCommand::Event { payload, .. } => {
                let _ = worker.handle(payload);
            }
            WorkerCommand::SyncEvent { client, payload, .. } => {
                client.reply(Ok(worker.handle(payload)));
            }
        }
        manager.worker_ready(id.clone()).await;
    }
}
