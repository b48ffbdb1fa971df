//! Worker-pool dispatch core.
//!
//! A broker that matches long-lived worker processes against an
//! unbounded stream of work requests — casts, synchronous calls with
//! deadlines, and state-machine events — through a single-threaded
//! dispatch loop. See [`handle::ManagerHandle`] for the public
//! submission surface and [`manager::Manager`] for the loop itself.
//!
//! Worker spawning/supervision beyond the demo stub in
//! [`worker::spawn_demo_worker`], load balancing across pools,
//! persistence of pending work, priority classes, and fair-share
//! scheduling are all out of scope for this crate.

pub mod clock;
pub mod config;
mod idle_set;
mod manager;
mod pending;
pub mod handle;
pub mod error;
pub mod registry;
pub mod reply;
pub mod tracer;
pub mod worker;
pub mod worker_id;

pub use config::QueueConfig;
pub use error::QueueError;
pub use handle::ManagerHandle;
pub use registry::{ManagerCounts, PoolStats, PoolSummary};
pub use reply::ReplyTo;
pub use tracer::{LatencySnapshot, LatencyTracer};
pub use worker::{spawn_demo_worker, Worker, WorkerCommand, WorkerHandle};
pub use worker_id::WorkerId;
