// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-cutting invariant specs over the published event stream.

use crate::prelude::*;
use nr_core::{DeviceExecutionResult, EventType, JobStatus};
use std::collections::HashMap;
use std::time::Duration;

/// Exactly one job_complete, and it is the last event of the stream.
#[tokio::test]
async fn job_complete_is_unique_and_final() {
    let h = Harness::new();
    let job = h.create_job(&["10.10.0.1", "10.10.0.2", "10.10.0.3"]);
    h.worker.script(key("10.10.0.2"), vec![DeviceExecutionResult::failed("boom")]);

    h.engine.run_job(job.job_id, run_config(2, false, 0)).await.unwrap();

    let events = h.bus.list(job.job_id, 0);
    let finals: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.event_type == EventType::JobComplete)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(finals, vec![events.len() - 1]);
}

/// Per device: one running event, then logs, then one terminal event.
#[tokio::test]
async fn per_device_events_are_causally_ordered() {
    let h = Harness::new();
    let hosts = ["10.11.0.1", "10.11.0.2", "10.11.0.3", "10.11.0.4"];
    let job = h.create_job(&hosts);

    h.engine.run_job(job.job_id, run_config(3, true, 0)).await.unwrap();

    let events = h.bus.list(job.job_id, 0);
    let mut phase: HashMap<String, u8> = HashMap::new(); // 0=unseen 1=running 2=terminal
    for event in &events {
        let Some(device) = &event.device else { continue };
        let device = device.as_str().to_string();
        let seen = phase.entry(device.clone()).or_insert(0);
        match event.event_type {
            EventType::DeviceStatus if event.status.as_deref() == Some("running") => {
                assert_eq!(*seen, 0, "{device}: second running event");
                *seen = 1;
            }
            EventType::Log => {
                assert_eq!(*seen, 1, "{device}: log outside running window");
            }
            EventType::DeviceStatus => {
                assert_eq!(*seen, 1, "{device}: terminal without running");
                *seen = 2;
            }
            _ => {}
        }
    }
    for host in hosts {
        assert_eq!(phase.get(&format!("{host}:22")), Some(&2));
    }
}

/// The canary's terminal event strictly precedes any fan-out running event.
#[tokio::test]
async fn canary_gates_fan_out() {
    let h = Harness::new();
    let job = h.create_job(&["10.12.0.1", "10.12.0.2", "10.12.0.3"]);

    h.engine.run_job(job.job_id, run_config(3, true, 0)).await.unwrap();

    let events = h.bus.list(job.job_id, 0);
    let canary = key("10.12.0.1");
    let canary_terminal = events
        .iter()
        .position(|e| {
            e.device.as_ref() == Some(&canary) && e.status.as_deref() == Some("success")
        })
        .unwrap();
    for (i, event) in events.iter().enumerate() {
        if event.event_type == EventType::DeviceStatus
            && event.device.as_ref() != Some(&canary)
            && event.status.as_deref() == Some("running")
        {
            assert!(canary_terminal < i);
        }
    }
}

/// Cancelling twice yields the same terminal state as cancelling once.
#[tokio::test]
async fn cancel_is_idempotent() {
    let h = Harness::with_delay(Duration::from_millis(200));
    let job = h.create_job(&["10.13.0.1", "10.13.0.2"]);
    let control = h.registry.control(job.job_id).unwrap();

    let engine = std::sync::Arc::clone(&h.engine);
    let job_id = job.job_id;
    let runner =
        tokio::spawn(async move { engine.run_job(job_id, run_config(1, true, 0)).await });

    h.wait_for_event(job_id, |e| e.event_type == EventType::JobStatus).await;
    control.cancel();
    control.cancel();

    let status = runner.await.unwrap().unwrap();
    assert_eq!(status, JobStatus::Cancelled);
    assert_eq!(h.registry.get(job_id).unwrap().status, JobStatus::Cancelled);

    let finals = h
        .bus
        .list(job_id, 0)
        .iter()
        .filter(|e| e.event_type == EventType::JobComplete)
        .count();
    assert_eq!(finals, 1);
}

/// Pause then resume leaves the job running with the same pending set.
#[tokio::test]
async fn pause_resume_preserves_pending_set() {
    let h = Harness::with_delay(Duration::from_millis(300));
    let hosts = ["10.14.0.1", "10.14.0.2", "10.14.0.3", "10.14.0.4"];
    let job = h.create_job(&hosts);
    let control = h.registry.control(job.job_id).unwrap();

    let engine = std::sync::Arc::clone(&h.engine);
    let job_id = job.job_id;
    let runner =
        tokio::spawn(async move { engine.run_job(job_id, run_config(1, true, 0)).await });

    h.wait_for_event(job_id, |e| {
        e.device.as_ref() == Some(&key("10.14.0.2")) && e.status.as_deref() == Some("running")
    })
    .await;

    h.registry.apply_event(job_id, nr_core::JobEvent::Pause).unwrap();
    control.pause();
    let paused_queued: Vec<String> = queued_keys(&h, job_id);
    assert_eq!(h.registry.get(job_id).unwrap().status, JobStatus::Paused);

    h.registry.apply_event(job_id, nr_core::JobEvent::Resume).unwrap();
    control.resume();
    assert_eq!(h.registry.get(job_id).unwrap().status, JobStatus::Running);
    // Nothing was cancelled or skipped by the pause itself.
    assert!(queued_keys(&h, job_id).len() <= paused_queued.len());

    let status = runner.await.unwrap().unwrap();
    assert_eq!(status, JobStatus::Completed);
}

fn queued_keys(h: &Harness, job_id: nr_core::JobId) -> Vec<String> {
    h.registry
        .get(job_id)
        .unwrap()
        .device_results
        .iter()
        .filter(|(_, r)| r.status == nr_core::DeviceStatus::Queued)
        .map(|(k, _)| k.as_str().to_string())
        .collect()
}
