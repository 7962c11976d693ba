// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seed scenario specs.

use crate::prelude::*;
use nr_core::{DeviceExecutionResult, DeviceStatus, JobStatus};
use std::time::Duration;

/// Happy path: canary then one fan-out device, both succeed.
#[tokio::test]
async fn happy_path_two_devices() {
    let h = Harness::new();
    let job = h.create_job(&["10.1.0.1", "10.1.0.2"]);

    let mut config = run_config(2, true, 1);
    config.stagger_delay_ms = 0;
    let status = h.engine.run_job(job.job_id, config).await.unwrap();

    assert_eq!(status, JobStatus::Completed);
    let rows = h.event_rows(job.job_id);
    let successes = rows
        .iter()
        .filter(|(t, _, s)| t == "device_status" && s.as_deref() == Some("success"))
        .count();
    assert_eq!(successes, 2);
    assert_eq!(
        rows.last().unwrap(),
        &("job_complete".to_string(), None, Some("completed".to_string()))
    );

    let stored = h.registry.get(job.job_id).unwrap();
    assert!(stored.device_results.values().all(|r| r.status == DeviceStatus::Success));
}

/// Canary failure aborts before any fan-out work.
#[tokio::test]
async fn canary_failure_aborts() {
    let h = Harness::new();
    let job = h.create_job(&["10.0.0.1", "10.0.0.2"]);
    h.worker.script(
        key("10.0.0.1"),
        vec![DeviceExecutionResult::failed("Command error detected: % Invalid input")],
    );

    let status = h.engine.run_job(job.job_id, run_config(2, true, 1)).await.unwrap();

    assert_eq!(status, JobStatus::Failed);
    // The worker ran exactly once, for the canary.
    assert_eq!(h.worker.invocations(), vec![key("10.0.0.1")]);
    // No event mentions the second device.
    assert!(h
        .event_rows(job.job_id)
        .iter()
        .all(|(_, device, _)| device.as_deref() != Some("10.0.0.2:22")));
}

/// A failed non-canary device is retried and succeeds on attempt two.
#[tokio::test]
async fn non_canary_retry_then_succeeds() {
    let h = Harness::new();
    let job = h.create_job(&["10.0.1.1", "10.0.1.2"]);
    h.worker.script(
        key("10.0.1.2"),
        vec![
            DeviceExecutionResult::failed("Connection failed: timeout"),
            DeviceExecutionResult::success(),
        ],
    );

    let status = h.engine.run_job(job.job_id, run_config(2, true, 1)).await.unwrap();

    assert_eq!(status, JobStatus::Completed);
    let result = &h.registry.get(job.job_id).unwrap().device_results[&key("10.0.1.2")];
    assert_eq!(result.status, DeviceStatus::Success);
    assert_eq!(result.attempts, 2);
}

/// Stop-on-error: the queued third device is never admitted and must not
/// be marked failed.
#[tokio::test]
async fn stop_on_error_with_pending_queue() {
    let h = Harness::new();
    let job = h.create_job(&["203.0.113.1", "203.0.113.2", "203.0.113.3"]);
    h.worker.script(
        key("203.0.113.2"),
        vec![DeviceExecutionResult::failed("Command error detected: Error:")],
    );

    let status = h.engine.run_job(job.job_id, run_config(1, true, 0)).await.unwrap();

    assert_eq!(status, JobStatus::Failed);
    assert!(!h.worker.invocations().contains(&key("203.0.113.3")));
    let third = &h.registry.get(job.job_id).unwrap().device_results[&key("203.0.113.3")];
    assert_eq!(third.status, DeviceStatus::Cancelled);
    // Never admitted: no running event for it.
    assert!(h
        .event_rows(job.job_id)
        .iter()
        .all(|(_, device, _)| device.as_deref() != Some("203.0.113.3:22")));
}

/// Cancel latched before the engine starts: the worker is never invoked
/// and the only completion event is job_complete=cancelled.
#[tokio::test]
async fn pre_run_cancel() {
    let h = Harness::new();
    let job = h.create_job(&["10.8.0.1"]);
    h.registry.control(job.job_id).unwrap().cancel();

    let status = h.engine.run_job(job.job_id, run_config(1, true, 0)).await.unwrap();

    assert_eq!(status, JobStatus::Cancelled);
    assert!(h.worker.invocations().is_empty());
    let rows = h.event_rows(job.job_id);
    let completions: Vec<_> = rows.iter().filter(|(t, _, _)| t == "job_complete").collect();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].2.as_deref(), Some("cancelled"));
}

/// Pause then cancel during fan-out: the in-flight device finishes via
/// its own checkpoint; pending devices are cancelled without running.
#[tokio::test]
async fn pause_then_cancel_during_fan_out() {
    let h = Harness::with_delay(Duration::from_millis(500));
    let job = h.create_job(&["10.9.2.1", "10.9.2.2", "10.9.2.3", "10.9.2.4"]);
    let control = h.registry.control(job.job_id).unwrap();

    let engine = std::sync::Arc::clone(&h.engine);
    let job_id = job.job_id;
    let runner =
        tokio::spawn(async move { engine.run_job(job_id, run_config(1, true, 0)).await });

    // Wait for the first non-canary device to transition to RUNNING.
    h.wait_for_event(job_id, |e| {
        e.event_type == nr_core::EventType::DeviceStatus
            && e.device.as_ref() == Some(&key("10.9.2.2"))
            && e.status.as_deref() == Some("running")
    })
    .await;

    // Operator pauses: status reads PAUSED within 300 ms.
    h.registry.apply_event(job_id, nr_core::JobEvent::Pause).unwrap();
    control.pause();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.registry.get(job_id).unwrap().status, JobStatus::Paused);

    // Operator cancels.
    control.cancel();
    let status = runner.await.unwrap().unwrap();
    assert_eq!(status, JobStatus::Cancelled);

    let stored = h.registry.get(job_id).unwrap();
    let running_device = &stored.device_results[&key("10.9.2.2")];
    assert!(
        matches!(running_device.status, DeviceStatus::Cancelled | DeviceStatus::Success),
        "in-flight device ended {:?}",
        running_device.status
    );
    for host in ["10.9.2.3", "10.9.2.4"] {
        assert_eq!(stored.device_results[&key(host)].status, DeviceStatus::Cancelled);
        assert!(h
            .event_rows(job_id)
            .iter()
            .all(|(t, device, s)| !(t == "device_status"
                && device.as_deref() == Some(&format!("{host}:22"))
                && s.as_deref() == Some("running"))));
    }
}
