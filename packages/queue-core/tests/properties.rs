//! Property tests over the invariants in the central matching rule.
//!
//! Each property drives the real [`queue_core::ManagerHandle`] through
//! a randomized sequence of operations and checks an invariant that
//! must hold no matter how the sequence is shaped. Each case gets its
//! own single-threaded runtime, spun up synchronously inside the
//! `proptest` closure.

use std::time::Duration;

use proptest::collection::vec;
use proptest::prelude::*;
use tokio::sync::mpsc;

use queue_core::{ManagerHandle, QueueConfig, WorkerCommand, WorkerHandle, WorkerId};

fn rt() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn spawn_recording_worker(
    label: &str,
) -> (
    WorkerHandle<String, String>,
    WorkerId,
    mpsc::UnboundedReceiver<String>,
) {
    let id = WorkerId::from(label.to_string());
    let (tx, mut rx) = mpsc::channel(64);
    let (record_tx, record_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                WorkerCommand::Cast(payload) => {
                    let _ = record_tx.send(payload);
                }
                WorkerCommand::Event { payload, .. } => {
                    let _ = record_tx.send(payload);
                }
                WorkerCommand::Call { client, payload } => {
                    let _ = record_tx.send(payload.clone());
                    client.reply(Ok(payload));
                }
                WorkerCommand::SyncEvent {
                    client, payload, ..
                } => {
                    let _ = record_tx.send(payload.clone());
                    client.reply(Ok(payload));
                }
            }
        }
    });

    (WorkerHandle::new(id.clone(), tx), id, record_rx)
}

proptest! {
    /// (P1) With no workers ever registered, every cast is enqueued and
    /// `pending_count` tracks the number of casts submitted so far,
    /// exactly.
    #[test]
    fn p1_pending_count_matches_queue_length(payloads in vec(any::<String>(), 0..30)) {
        rt().block_on(async {
            let pool: ManagerHandle<String, String> =
                ManagerHandle::spawn(format!("p1-{}", payloads.len()), QueueConfig::default());
            for (i, payload) in payloads.iter().enumerate() {
                pool.cast(payload.clone()).await.unwrap();
                let counts = pool.counts().await.unwrap();
                prop_assert_eq!(counts.pending, i + 1);
            }
            Ok(())
        })?;
    }

    /// (P2) Whenever pending work exists, no worker is idle.
    #[test]
    fn p2_pending_excludes_idle(num_casts in 1usize..10, num_workers in 0usize..5) {
        rt().block_on(async {
            let pool: ManagerHandle<String, String> = ManagerHandle::spawn(
                format!("p2-{num_casts}-{num_workers}"),
                QueueConfig::default(),
            );
            for _ in 0..num_workers {
                let (handle, id, _records) = spawn_recording_worker(&format!("w{}", _uuid()));
                pool.new_worker(id, handle).await;
            }
            // Drain any workers that got dispatched nothing yet by
            // marking them busy, so the starting state is "all idle
            // workers are genuinely idle, no pending work".
            for _ in 0..num_casts {
                pool.cast("x".to_string()).await.unwrap();
                let counts = pool.counts().await.unwrap();
                if counts.pending > 0 {
                    prop_assert_eq!(counts.idle, 0);
                }
            }
            Ok(())
        })?;
    }

    /// (P3) Casts queued while no worker is available are delivered to
    /// the first worker to arrive in the exact order they were
    /// submitted.
    #[test]
    fn p3_fifo_delivery_order(payloads in vec("[a-z]{1,8}", 1..15)) {
        rt().block_on(async {
            let pool: ManagerHandle<String, String> =
                ManagerHandle::spawn(format!("p3-{}", payloads.len()), QueueConfig::default());
            for payload in &payloads {
                pool.cast(payload.clone()).await.unwrap();
            }

            let (handle, id, mut records) = spawn_recording_worker("w3");
            pool.new_worker(id.clone(), handle).await;

            let mut received = Vec::new();
            for _ in 0..payloads.len() {
                received.push(records.recv().await.unwrap());
                pool.worker_ready(id.clone()).await;
            }
            prop_assert_eq!(received, payloads);
            Ok(())
        })?;
    }

    /// (P4) Among several idle workers, the smallest identifier is
    /// always the one chosen.
    #[test]
    fn p4_smallest_identifier_wins(mut labels in vec("[a-z]{3,6}", 2..6)) {
        labels.sort();
        labels.dedup();
        prop_assume!(labels.len() >= 2);

        rt().block_on(async {
            let pool: ManagerHandle<String, String> =
                ManagerHandle::spawn(format!("p4-{}", labels.join("-")), QueueConfig::default());

            let mut receivers = Vec::new();
            for label in &labels {
                let (handle, id, records) = spawn_recording_worker(label);
                pool.new_worker(id, handle).await;
                receivers.push((label.clone(), records));
            }

            pool.cast("only-one".to_string()).await.unwrap();

            let smallest = labels.iter().min().unwrap().clone();
            for (label, mut records) in receivers {
                if label == smallest {
                    prop_assert_eq!(records.recv().await.unwrap(), "only-one");
                } else {
                    prop_assert!(records.try_recv().is_err());
                }
            }
            Ok(())
        })?;
    }

    /// (P5) A worker becoming ready against a backlog of entries that
    /// are all already expired drains the entire backlog in one
    /// `worker_ready` handling, in bounded time, and ends up idle.
    #[test]
    fn p5_recursion_drains_expired_backlog(backlog_size in 1usize..12) {
        rt().block_on(async {
            let pool: ManagerHandle<String, String> =
                ManagerHandle::spawn(format!("p5-{backlog_size}"), QueueConfig::default());

            let mut tasks = Vec::new();
            for i in 0..backlog_size {
                let p = pool.clone();
                tasks.push(tokio::spawn(async move {
                    p.call(format!("e{i}"), Some(Duration::from_millis(1))).await
                }));
            }
            for task in tasks {
                let _ = task.await;
            }
            tokio::time::sleep(Duration::from_millis(15)).await;

            let (handle, id, mut records) = spawn_recording_worker("w5");
            pool.new_worker(id, handle).await;
            tokio::time::sleep(Duration::from_millis(15)).await;

            prop_assert!(records.try_recv().is_err());
            let counts = pool.counts().await.unwrap();
            prop_assert_eq!(counts.pending, 0);
            prop_assert_eq!(counts.idle, 1);
            Ok(())
        })?;
    }
}

fn _uuid() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[test]
fn idempotence_unknown_worker_busy_and_dead() {
    rt().block_on(async {
        let pool: ManagerHandle<String, String> =
            ManagerHandle::spawn("idempotence-unknown", QueueConfig::default());
        let ghost = WorkerId::from("ghost");
        pool.worker_busy(ghost.clone()).await;
        pool.worker_dead(ghost).await;
        let counts = pool.counts().await.unwrap();
        assert_eq!(counts.known, 0);
        assert_eq!(counts.idle, 0);
    });
}

#[test]
fn idempotence_busy_then_ready_restores_idle() {
    rt().block_on(async {
        let pool: ManagerHandle<String, String> =
            ManagerHandle::spawn("idempotence-busy-ready", QueueConfig::default());
        let id = WorkerId::from("w1");
        let (tx, _rx) = mpsc::channel(8);
        pool.new_worker(id.clone(), WorkerHandle::new(id.clone(), tx))
            .await;
        pool.worker_busy(id.clone()).await;
        pool.worker_ready(id).await;
        let counts = pool.counts().await.unwrap();
        assert_eq!(counts.idle, 1);
        assert_eq!(counts.known, 1);
    });
}

#[test]
fn boundary_infinite_timeout_never_expires() {
    rt().block_on(async {
        let pool: ManagerHandle<String, String> =
            ManagerHandle::spawn("boundary-infinite", QueueConfig::default());
        let call_pool = pool.clone();
        let task = tokio::spawn(async move { call_pool.call("late".to_string(), None).await });

        tokio::time::sleep(Duration::from_millis(200)).await;

        let id = WorkerId::from("w1");
        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(async move {
            if let Some(WorkerCommand::Call { client, payload }) = rx.recv().await {
                client.reply(Ok(payload));
            }
        });
        pool.new_worker(id, WorkerHandle::new(WorkerId::from("w1"), tx))
            .await;

        assert_eq!(task.await.unwrap().unwrap(), "late");
    });
}
