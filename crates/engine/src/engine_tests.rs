// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::DEFAULT_HISTORY_LIMIT;
use async_trait::async_trait;
use nr_core::test_support::{profile, spec, target};
use nr_core::{DeviceProfile, EventType, FakeClock};
use nr_worker::SimulatedDeviceWorker;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Harness {
    registry: Arc<JobRegistry<FakeClock>>,
    bus: Arc<EventBus>,
    worker: Arc<SimulatedDeviceWorker>,
    engine: ExecutionEngine<FakeClock>,
}

fn harness_with_worker(worker: Arc<dyn DeviceWorker>) -> (Arc<JobRegistry<FakeClock>>, Arc<EventBus>, ExecutionEngine<FakeClock>) {
    let clock = FakeClock::new();
    let registry = Arc::new(JobRegistry::new(clock.clone(), DEFAULT_HISTORY_LIMIT));
    let bus = Arc::new(EventBus::new());
    let engine = ExecutionEngine::new(Arc::clone(&registry), Arc::clone(&bus), worker, clock);
    (registry, bus, engine)
}

fn harness() -> Harness {
    let worker = Arc::new(SimulatedDeviceWorker::new(Duration::ZERO));
    let (registry, bus, engine) = harness_with_worker(Arc::clone(&worker) as Arc<dyn DeviceWorker>);
    Harness { registry, bus, worker, engine }
}

fn inventory(hosts: &[&str]) -> Vec<DeviceProfile> {
    hosts.iter().map(|h| profile(h)).collect()
}

fn create(h: &Harness, hosts: &[&str]) -> JobRecord {
    h.registry.create(spec(hosts), &inventory(hosts)).unwrap()
}

fn event_kinds(bus: &EventBus, job_id: JobId) -> Vec<(EventType, Option<String>)> {
    bus.list(job_id, 0).into_iter().map(|e| (e.event_type, e.status)).collect()
}

#[tokio::test]
async fn canary_not_in_targets_fails_with_synthetic_result() {
    let h = harness();
    let mut s = spec(&["10.0.0.1"]);
    s.canary = target("10.9.9.9");
    let job = h.registry.create(s, &inventory(&["10.0.0.1"])).unwrap();

    let status = h.engine.run_job(job.job_id, RunConfig::default()).await.unwrap();

    assert_eq!(status, JobStatus::Failed);
    assert!(h.worker.invocations().is_empty());
    let stored = h.registry.get(job.job_id).unwrap();
    let synthetic = &stored.device_results[&target("10.9.9.9").key()];
    assert_eq!(synthetic.status, DeviceStatus::Failed);
    assert_eq!(synthetic.error.as_deref(), Some("Canary is not part of target devices"));

    let kinds = event_kinds(&h.bus, job.job_id);
    assert_eq!(kinds.last().unwrap(), &(EventType::JobComplete, Some("failed".to_string())));
}

#[tokio::test]
async fn canary_terminal_event_precedes_fanout_running() {
    let h = harness();
    let job = create(&h, &["10.1.0.1", "10.1.0.2", "10.1.0.3"]);

    h.engine.run_job(job.job_id, RunConfig::default()).await.unwrap();

    let events = h.bus.list(job.job_id, 0);
    let canary_key = target("10.1.0.1").key();
    let canary_terminal = events
        .iter()
        .position(|e| {
            e.event_type == EventType::DeviceStatus
                && e.device.as_ref() == Some(&canary_key)
                && e.status.as_deref() == Some("success")
        })
        .unwrap();
    let first_fanout_running = events
        .iter()
        .position(|e| {
            e.event_type == EventType::DeviceStatus
                && e.device.as_ref() != Some(&canary_key)
                && e.status.as_deref() == Some("running")
        })
        .unwrap();
    assert!(canary_terminal < first_fanout_running);
}

#[tokio::test]
async fn worker_cancel_result_cancels_the_job() {
    let h = harness();
    let job = create(&h, &["10.2.0.1", "10.2.0.2", "10.2.0.3"]);
    h.worker.script(
        target("10.2.0.2").key(),
        vec![DeviceExecutionResult::cancelled("operator abort")],
    );

    let mut config = RunConfig::default();
    config.concurrency_limit = 1;
    let status = h.engine.run_job(job.job_id, config).await.unwrap();

    assert_eq!(status, JobStatus::Cancelled);
    let stored = h.registry.get(job.job_id).unwrap();
    assert_eq!(stored.device_results[&target("10.2.0.3").key()].status, DeviceStatus::Cancelled);
    // The skipped device was never admitted: no events carry its key.
    assert!(h
        .bus
        .list(job.job_id, 0)
        .iter()
        .all(|e| e.device.as_ref() != Some(&target("10.2.0.3").key())));
}

#[tokio::test]
async fn failed_device_is_retried_with_attempt_count() {
    let h = harness();
    let job = create(&h, &["10.3.0.1", "10.3.0.2"]);
    h.worker.script(
        target("10.3.0.2").key(),
        vec![
            DeviceExecutionResult::failed("Connection failed: timeout"),
            DeviceExecutionResult::success(),
        ],
    );

    let mut config = RunConfig::default();
    config.non_canary_retry_limit = 1;
    let status = h.engine.run_job(job.job_id, config).await.unwrap();

    assert_eq!(status, JobStatus::Completed);
    let result = &h.registry.get(job.job_id).unwrap().device_results[&target("10.3.0.2").key()];
    assert_eq!(result.status, DeviceStatus::Success);
    assert_eq!(result.attempts, 2);
}

#[tokio::test]
async fn retry_limit_exhaustion_keeps_last_failure() {
    let h = harness();
    let job = create(&h, &["10.4.0.1", "10.4.0.2"]);
    h.worker.script(
        target("10.4.0.2").key(),
        vec![
            DeviceExecutionResult::failed("first"),
            DeviceExecutionResult::failed("second"),
        ],
    );

    let mut config = RunConfig::default();
    config.non_canary_retry_limit = 1;
    let status = h.engine.run_job(job.job_id, config).await.unwrap();

    assert_eq!(status, JobStatus::Failed);
    let result = &h.registry.get(job.job_id).unwrap().device_results[&target("10.4.0.2").key()];
    assert_eq!(result.error.as_deref(), Some("second"));
    assert_eq!(result.attempts, 2);
}

/// Worker that tracks its own concurrency high-water mark.
struct CountingWorker {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl CountingWorker {
    fn new() -> Self {
        Self { current: AtomicUsize::new(0), max: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl DeviceWorker for CountingWorker {
    async fn run(&self, _request: WorkRequest) -> DeviceExecutionResult {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        DeviceExecutionResult::success()
    }
}

#[tokio::test]
async fn in_flight_tasks_never_exceed_concurrency_limit() {
    let worker = Arc::new(CountingWorker::new());
    let (registry, _bus, engine) =
        harness_with_worker(Arc::clone(&worker) as Arc<dyn DeviceWorker>);
    let hosts = ["10.5.0.1", "10.5.0.2", "10.5.0.3", "10.5.0.4", "10.5.0.5", "10.5.0.6"];
    let job = registry.create(spec(&hosts), &inventory(&hosts)).unwrap();

    let mut config = RunConfig::default();
    config.concurrency_limit = 2;
    let status = engine.run_job(job.job_id, config).await.unwrap();

    assert_eq!(status, JobStatus::Completed);
    assert!(worker.max.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn run_job_rejects_invalid_run_config() {
    let h = harness();
    let job = create(&h, &["10.6.0.1"]);
    let mut config = RunConfig::default();
    config.non_canary_retry_limit = 9;

    let err = h.engine.run_job(job.job_id, config).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    // The job never started.
    assert_eq!(h.registry.get(job.job_id).unwrap().status, JobStatus::Queued);
}

#[tokio::test]
async fn run_job_on_terminal_job_is_a_conflict() {
    let h = harness();
    let job = create(&h, &["10.7.0.1"]);
    h.registry.apply_event(job.job_id, JobEvent::Cancel).unwrap();

    let err = h.engine.run_job(job.job_id, RunConfig::default()).await.unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));
}
