// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::DEFAULT_HISTORY_LIMIT;
use nr_core::test_support::{profile, spec};
use nr_core::FakeClock;

fn registry() -> JobRegistry<FakeClock> {
    JobRegistry::new(FakeClock::new(), DEFAULT_HISTORY_LIMIT)
}

fn inventory(hosts: &[&str]) -> Vec<DeviceProfile> {
    hosts.iter().map(|h| profile(h)).collect()
}

#[test]
fn create_snapshots_device_params() {
    let registry = registry();
    let job = registry.create(spec(&["10.0.0.1", "10.0.0.2"]), &inventory(&["10.0.0.1", "10.0.0.2"])).unwrap();

    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.device_results.len(), 2);
    assert_eq!(job.device_params.len(), 2);
    let key = profile("10.0.0.1").key();
    assert_eq!(job.device_params[&key].username, "admin");
}

#[test]
fn create_uses_whole_inventory_when_devices_empty() {
    let registry = registry();
    let mut s = spec(&["10.0.0.1"]);
    s.devices.clear();
    let job = registry.create(s, &inventory(&["10.0.0.1", "10.0.0.2", "10.0.0.3"])).unwrap();
    assert_eq!(job.device_results.len(), 3);
}

#[test]
fn create_refuses_unknown_target() {
    let registry = registry();
    let err = registry.create(spec(&["10.0.0.1", "10.0.0.9"]), &inventory(&["10.0.0.1"])).unwrap_err();
    assert_eq!(err, EngineError::UnknownDevice(profile("10.0.0.9").key()));
}

#[test]
fn create_refuses_empty_inventory() {
    let registry = registry();
    let mut s = spec(&[]);
    s.devices.clear();
    assert_eq!(registry.create(s, &[]).unwrap_err(), EngineError::NoDevices);
}

#[test]
fn single_active_job_guard() {
    let registry = registry();
    let inv = inventory(&["10.0.0.1"]);
    let first = registry.create(spec(&["10.0.0.1"]), &inv).unwrap();

    let err = registry.create(spec(&["10.0.0.1"]), &inv).unwrap_err();
    assert_eq!(err, EngineError::ActiveJobConflict(first.job_id));

    // A terminal job releases the guard.
    registry.apply_event(first.job_id, JobEvent::Cancel).unwrap();
    assert!(registry.create(spec(&["10.0.0.1"]), &inv).is_ok());
}

#[test]
fn snapshot_survives_inventory_replacement() {
    let registry = registry();
    let job = registry.create(spec(&["10.0.0.1"]), &inventory(&["10.0.0.1"])).unwrap();
    let key = profile("10.0.0.1").key();

    // Re-import happens: the store is replaced with different credentials.
    // The job's snapshot must be unaffected.
    let stored = registry.get(job.job_id).unwrap();
    assert_eq!(stored.device_params[&key].password, "secret");
}

#[test]
fn apply_event_sets_timestamps() {
    let clock = FakeClock::new();
    let registry = JobRegistry::new(clock.clone(), DEFAULT_HISTORY_LIMIT);
    let job = registry.create(spec(&["10.0.0.1"]), &inventory(&["10.0.0.1"])).unwrap();

    clock.advance(std::time::Duration::from_secs(1));
    let started = registry.apply_event(job.job_id, JobEvent::Start).unwrap();
    assert_eq!(started.status, JobStatus::Running);
    assert!(started.started_at.is_some());
    assert!(started.completed_at.is_none());

    clock.advance(std::time::Duration::from_secs(1));
    let done = registry.apply_event(job.job_id, JobEvent::Complete).unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert!(done.completed_at > done.started_at);
}

#[test]
fn apply_event_rejects_invalid_transition() {
    let registry = registry();
    let job = registry.create(spec(&["10.0.0.1"]), &inventory(&["10.0.0.1"])).unwrap();
    let err = registry.apply_event(job.job_id, JobEvent::Complete).unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));
}

#[test]
fn list_is_reverse_chronological() {
    let registry = registry();
    let inv = inventory(&["10.0.0.1"]);
    let first = registry.create(spec(&["10.0.0.1"]), &inv).unwrap();
    registry.apply_event(first.job_id, JobEvent::Cancel).unwrap();
    let second = registry.create(spec(&["10.0.0.1"]), &inv).unwrap();

    let ids: Vec<JobId> = registry.list().into_iter().map(|j| j.job_id).collect();
    assert_eq!(ids, vec![second.job_id, first.job_id]);
    assert_eq!(registry.active().map(|j| j.job_id), Some(second.job_id));
}

#[test]
fn history_eviction_drops_oldest_terminal() {
    let clock = FakeClock::new();
    let registry = JobRegistry::new(clock.clone(), 2);
    let inv = inventory(&["10.0.0.1"]);

    let mut ids = Vec::new();
    for _ in 0..4 {
        let job = registry.create(spec(&["10.0.0.1"]), &inv).unwrap();
        registry.apply_event(job.job_id, JobEvent::Cancel).unwrap();
        clock.advance(std::time::Duration::from_secs(1));
        ids.push(job.job_id);
    }

    let kept: Vec<JobId> = registry.list().into_iter().map(|j| j.job_id).collect();
    assert_eq!(kept, vec![ids[3], ids[2]]);
    assert_eq!(registry.get(ids[0]).unwrap_err(), EngineError::JobNotFound(ids[0]));
}

#[test]
fn update_device_result_is_atomic_with_get() {
    let registry = registry();
    let job = registry.create(spec(&["10.0.0.1"]), &inventory(&["10.0.0.1"])).unwrap();
    let key = profile("10.0.0.1").key();

    let updated = registry
        .update_device_result(job.job_id, &key, |r| {
            r.status = nr_core::DeviceStatus::Running;
        })
        .unwrap();
    assert_eq!(updated.status, nr_core::DeviceStatus::Running);
    assert_eq!(
        registry.get(job.job_id).unwrap().device_results[&key].status,
        nr_core::DeviceStatus::Running
    );
}

#[test]
fn cancel_pending_devices_skips_terminal_results() {
    let registry = registry();
    let job = registry.create(spec(&["10.0.0.1", "10.0.0.2"]), &inventory(&["10.0.0.1", "10.0.0.2"])).unwrap();
    let done_key = profile("10.0.0.1").key();
    registry
        .update_device_result(job.job_id, &done_key, |r| {
            r.status = nr_core::DeviceStatus::Success;
        })
        .unwrap();

    let changed = registry.cancel_pending_devices(job.job_id).unwrap();
    assert_eq!(changed, vec![profile("10.0.0.2").key()]);
}

#[test]
fn record_canary_failure_inserts_synthetic_result() {
    let registry = registry();
    let mut s = spec(&["10.0.0.1"]);
    s.canary = nr_core::test_support::target("10.9.9.9");
    let job = registry.create(s, &inventory(&["10.0.0.1"])).unwrap();

    let result = registry.record_canary_failure(job.job_id, "Canary is not part of target devices").unwrap();
    assert_eq!(result.status, nr_core::DeviceStatus::Failed);
    let stored = registry.get(job.job_id).unwrap();
    assert!(stored.device_results.contains_key(&nr_core::test_support::target("10.9.9.9").key()));
}
