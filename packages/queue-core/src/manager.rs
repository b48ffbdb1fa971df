//! The dispatch loop: a single-threaded serializer mediating between
//! submitters and workers. This is the core of the broker — everything
//! else in this crate is peripheral to it.
//!
//! All mutation of `idle`, `pending`, and `pending_count` happens here,
//! inside the one task that owns [`Manager`]. Submitters and workers
//! never touch this state directly; they send messages through
//! [`crate::handle::ManagerHandle`] and [`crate::worker::WorkerHandle`]
//! respectively.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::clock;
use crate::idle_set::IdleWorkers;
use crate::pending::{PendingQueue, WorkItem};
use crate::registry::ManagerCounts;
use crate::reply::ReplyTo;
use crate::worker::{WorkerCommand, WorkerHandle};
use crate::worker_id::WorkerId;

/// Messages the dispatch loop processes, one at a time, to completion,
/// in the order they were received. This "one message at a time"
/// invariant is the whole of the concurrency model.
pub(crate) enum ManagerMessage<Req, Resp> {
    NewWorker {
        id: WorkerId,
        handle: WorkerHandle<Req, Resp>,
    },
    WorkerReady {
        id: WorkerId,
    },
    WorkerBusy {
        id: WorkerId,
    },
    WorkerDead {
        id: WorkerId,
    },
    Cast {
        payload: Req,
    },
    Event {
        payload: Req,
        all_state: bool,
    },
    Call {
        payload: Req,
        timeout: Option<Duration>,
        client: ReplyTo<Resp>,
    },
    SyncEvent {
        payload: Req,
        timeout: Option<Duration>,
        all_state: bool,
        client: ReplyTo<Resp>,
    },
    Counts {
        reply: oneshot::Sender<ManagerCounts>,
    },
    Shutdown {
        reason: String,
    },
}

/// Owned, single-threaded state of one pool's dispatch loop.
pub struct Manager<Req, Resp> {
    pool_name: String,
    rx: mpsc::Receiver<ManagerMessage<Req, Resp>>,
    idle: IdleWorkers,
    handles: HashMap<WorkerId, WorkerHandle<Req, Resp>>,
    pending: PendingQueue<Req, Resp>,
    pending_count: usize,
}

impl<Req, Resp> Manager<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub(crate) fn new(pool_name: String, rx: mpsc::Receiver<ManagerMessage<Req, Resp>>) -> Self {
        Self {
            pool_name,
            rx,
            idle: IdleWorkers::new(),
            handles: HashMap::new(),
            pending: PendingQueue::new(),
            pending_count: 0,
        }
    }

    /// Run the dispatch loop until the channel closes or a `Shutdown`
    /// message arrives.
    pub async fn run(mut self) {
        loop {
            match self.rx.recv().await {
                Some(ManagerMessage::Shutdown { reason }) => {
                    self.shutdown(reason);
                    return;
                }
                Some(msg) => self.handle_message(msg),
                None => {
                    // All ManagerHandles were dropped; drain as if told to.
                    self.shutdown("manager handle dropped".to_string());
                    return;
                }
            }
        }
    }

    fn handle_message(&mut self, msg: ManagerMessage<Req, Resp>) {
        match msg {
            ManagerMessage::NewWorker { id, handle } => self.new_worker(id, handle),
            ManagerMessage::WorkerReady { id } => self.worker_ready(id),
            ManagerMessage::WorkerBusy { id } => self.worker_busy(id),
            ManagerMessage::WorkerDead { id } => self.worker_dead(id),
            ManagerMessage::Cast { payload } => self.cast_to_available_worker(payload),
            ManagerMessage::Event { payload, all_state } => {
                self.send_event_to_available_worker(payload, all_state)
            }
            ManagerMessage::Call {
                payload,
                timeout,
                client,
            } => self.call_available_worker(payload, timeout, client),
            ManagerMessage::SyncEvent {
                payload,
                timeout,
                all_state,
                client,
            } => self.sync_send_event_to_available_worker(payload, timeout, all_state, client),
            ManagerMessage::Counts { reply } => {
                let _ = reply.send(self.counts());
            }
            ManagerMessage::Shutdown { .. } => unreachable!("handled in run()"),
        }
    }

    // -- lifecycle notifications --------------------------------------

    fn new_worker(&mut self, id: WorkerId, handle: WorkerHandle<Req, Resp>) {
        self.handles.insert(id.clone(), handle);
        self.worker_ready(id);
    }

    fn worker_busy(&mut self, id: WorkerId) {
        self.idle.remove(&id);
    }

    fn worker_dead(&mut self, id: WorkerId) {
        self.idle.remove(&id);
        self.handles.remove(&id);
    }

    /// The central matching rule. Implemented as a loop, not
    /// recursion: each iteration either dispatches and returns, or
    /// drops exactly one expired/dead pending entry and continues, so
    /// it always terminates in at most `|pending|` steps.
    fn worker_ready(&mut self, id: WorkerId) {
        loop {
            let Some(item) = self.pending.pop_front() else {
                self.idle.insert(id);
                return;
            };
            self.pending_count -= 1;

            match item {
                WorkItem::Cast { payload } => {
                    self.send_to(&id, WorkerCommand::Cast(payload));
                    return;
                }
                WorkItem::Event { payload, all_state } => {
                    self.send_to(&id, WorkerCommand::Event { payload, all_state });
                    return;
                }
                WorkItem::Call {
                    client,
                    payload,
                    deadline,
                } => {
                    if client.is_alive() && clock::is_live(deadline, clock::now()) {
                        self.send_to(&id, WorkerCommand::Call { client, payload });
                        return;
                    }
                    log::info!(
                        target: "queue_core::manager",
                        "pool {}: dropped expired/dead call while matching worker {id}",
                        self.pool_name,
                    );
                    // Do not reinsert `id`, do not rewind `pending`;
                    // loop consumes the next entry against the same id.
                }
                WorkItem::SyncEvent {
                    client,
                    payload,
                    deadline,
                    all_state,
                } => {
                    if client.is_alive() && clock::is_live(deadline, clock::now()) {
                        self.send_to(
                            &id,
                            WorkerCommand::SyncEvent {
                                client,
                                payload,
                                all_state,
                            },
                        );
                        return;
                    }
                    log::info!(
                        target: "queue_core::manager",
                        "pool {}: dropped expired/dead sync event while matching worker {id}",
                        self.pool_name,
                    );
                }
            }
        }
    }

    // -- work submissions -----------------------------------------------

    fn cast_to_available_worker(&mut self, payload: Req) {
        match self.idle.take_smallest() {
            Some(id) => self.send_to(&id, WorkerCommand::Cast(payload)),
            None => self.enqueue(WorkItem::Cast { payload }),
        }
    }

    fn send_event_to_available_worker(&mut self, payload: Req, all_state: bool) {
        match self.idle.take_smallest() {
            Some(id) => self.send_to(&id, WorkerCommand::Event { payload, all_state }),
            None => self.enqueue(WorkItem::Event { payload, all_state }),
        }
    }

    fn call_available_worker(
        &mut self,
        payload: Req,
        timeout: Option<Duration>,
        client: ReplyTo<Resp>,
    ) {
        let deadline = clock::deadline_after(timeout);
        match self.idle.take_smallest() {
            Some(id) => {
                if client.is_alive() && clock::is_live(deadline, clock::now()) {
                    self.send_to(&id, WorkerCommand::Call { client, payload });
                } else {
                    log::info!(
                        target: "queue_core::manager",
                        "pool {}: dropped call at immediate-dispatch time, worker {id} stays idle",
                        self.pool_name,
                    );
                    self.idle.insert(id);
                }
            }
            None => self.enqueue(WorkItem::Call {
                client,
                payload,
                deadline,
            }),
        }
    }

    fn sync_send_event_to_available_worker(
        &mut self,
        payload: Req,
        timeout: Option<Duration>,
        all_state: bool,
        client: ReplyTo<Resp>,
    ) {
        let deadline = clock::deadline_after(timeout);
        match self.idle.take_smallest() {
            Some(id) => {
                if client.is_alive() && clock::is_live(deadline, clock::now()) {
                    self.send_to(
                        &id,
                        WorkerCommand::SyncEvent {
                            client,
                            payload,
                            all_state,
                        },
                    );
                } else {
                    log::info!(
                        target: "queue_core::manager",
                        "pool {}: dropped sync event at immediate-dispatch time, worker {id} stays idle",
                        self.pool_name,
                    );
                    self.idle.insert(id);
                }
            }
            None => self.enqueue(WorkItem::SyncEvent {
                client,
                payload,
                deadline,
                all_state,
            }),
        }
    }

    // -- introspection & termination ----------------------------------

    fn counts(&self) -> ManagerCounts {
        ManagerCounts {
            idle: self.idle.len(),
            known: self.handles.len(),
            pending: self.pending_count,
        }
    }

    /// Drain `pending` head-first, replying `queue_shutdown` to every
    /// waiting client and logging every lost fire-and-forget item.
    /// Idle workers are left untouched.
    fn shutdown(&mut self, reason: String) {
        for item in self.pending.drain() {
            match item {
                WorkItem::Cast { .. } => {
                    log::info!(
                        target: "queue_core::manager",
                        "pool {}: cast lost on terminate, reason={reason}",
                        self.pool_name,
                    );
                }
                WorkItem::Event { .. } => {
                    log::info!(
                        target: "queue_core::manager",
                        "pool {}: event lost on terminate, reason={reason}",
                        self.pool_name,
                    );
                }
                WorkItem::Call { client, .. } => {
                    client.reply(Err(crate::error::QueueError::QueueShutdown {
                        reason: reason.clone(),
                    }));
                }
                WorkItem::SyncEvent { client, .. } => {
                    client.reply(Err(crate::error::QueueError::QueueShutdown {
                        reason: reason.clone(),
                    }));
                }
            }
        }
        self.pending_count = 0;
    }

    fn enqueue(&mut self, item: WorkItem<Req, Resp>) {
        self.pending.push_back(item);
        self.pending_count += 1;
    }

    /// Best-effort hand-off to a specific worker. A failed send means
    /// the worker's mailbox is already gone (it died without notifying
    /// us yet); we log and drop the work, and treat the worker as dead
    /// so a later explicit `worker_dead` is redundant, not required.
    fn send_to(&mut self, id: &WorkerId, command: WorkerCommand<Req, Resp>) {
        let Some(handle) = self.handles.get(id) else {
            log::warn!(
                target: "queue_core::manager",
                "pool {}: no handle for worker {id}, dropping work",
                self.pool_name,
            );
            return;
        };
        if !handle.send(command) {
            log::warn!(
                target: "queue_core::manager",
                "pool {}: send to worker {id} failed, treating as dead",
                self.pool_name,
            );
            self.handles.remove(id);
        }
    }
}
