//! Orchestration for the `demo` subcommand: spawns a pool, registers a
//! handful of demo workers, drives synthetic traffic through it, and
//! reports what the dispatch loop saw.

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use queue_core::{spawn_demo_worker, ManagerHandle, QueueConfig, WorkerHandle, WorkerId};

use crate::args::DemoArgs;

pub struct DemoRunner {
    args: DemoArgs,
}

impl DemoRunner {
    pub fn new(args: DemoArgs) -> Self {
        Self { args }
    }

    pub async fn run(&self) -> Result<()> {
        let pool: ManagerHandle<String, String> =
            ManagerHandle::spawn(self.args.pool_name(), QueueConfig::default());

        println!("=== queue-cli demo ===");
        println!("pool: {}", self.args.pool_name());
        println!("workers: {}", self.args.workers());

        for i in 0..self.args.workers() {
            let id = WorkerId::from(format!("worker-{i}"));
            let (tx, rx) = mpsc::channel(32);
            tokio::spawn(spawn_demo_worker(pool.clone(), id.clone(), rx, |payload: String| {
                format!("processed({payload})")
            }));
            pool.new_worker(id.clone(), WorkerHandle::new(id, tx)).await;
        }

        for i in 0..self.args.casts() {
            pool.cast(format!("cast-{i}"))
                .await
                .context("submitting cast")?;
        }

        let mut failures = 0usize;
        for i in 0..self.args.calls() {
            match pool
                .call(format!("call-{i}"), Some(self.args.timeout()))
                .await
            {
                Ok(resp) => log::debug!("call-{i} -> {resp}"),
                Err(err) => {
                    failures += 1;
                    log::warn!("call-{i} failed: {err}");
                }
            }
        }

        // Give the workers a moment to finish casts before we read counts.
        tokio::task::yield_now().await;

        let counts = pool.counts().await.context("reading pool counts")?;
        println!(
            "final counts: idle={} known={} pending={}",
            counts.idle, counts.known, counts.pending
        );
        println!(
            "calls: {} ok, {} failed",
            self.args.calls() - failures,
            failures
        );

        pool.shutdown("demo complete").await;
        Ok(())
    }
}
