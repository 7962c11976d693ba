// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;
use tokio::sync::Notify;

#[tokio::test]
async fn start_refuses_second_runner_for_same_job() {
    let coordinator = RunCoordinator::new();
    let job_id = JobId::new();
    let release = Arc::new(Notify::new());

    let gate = Arc::clone(&release);
    assert!(coordinator.start(job_id, async move {
        gate.notified().await;
    }));
    assert!(coordinator.is_running(job_id));
    assert!(!coordinator.start(job_id, async {}));

    release.notify_one();
}

#[tokio::test]
async fn finished_runner_is_reaped_for_reuse() {
    let coordinator = RunCoordinator::new();
    let job_id = JobId::new();

    assert!(coordinator.start(job_id, async {}));
    // Let the no-op runner finish.
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    assert!(!coordinator.is_running(job_id));
    assert!(coordinator.start(job_id, async {}));
}

#[tokio::test]
async fn distinct_jobs_run_concurrently() {
    let coordinator = RunCoordinator::new();
    let release = Arc::new(Notify::new());

    let a = JobId::new();
    let b = JobId::new();
    let gate_a = Arc::clone(&release);
    let gate_b = Arc::clone(&release);
    assert!(coordinator.start(a, async move { gate_a.notified().await }));
    assert!(coordinator.start(b, async move { gate_b.notified().await }));
    assert!(coordinator.is_running(a));
    assert!(coordinator.is_running(b));

    release.notify_waiters();
}
