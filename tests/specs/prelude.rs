// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for scenario specs.

use nr_core::test_support::profile;
use nr_core::{DeviceKey, DeviceProfile, DeviceTarget, FakeClock, JobId, JobRecord, RunConfig};
use nr_engine::{EventBus, ExecutionEngine, JobRegistry, DEFAULT_HISTORY_LIMIT};
use nr_worker::{DeviceWorker, SimulatedDeviceWorker};
use std::sync::Arc;
use std::time::Duration;

pub struct Harness {
    pub registry: Arc<JobRegistry<FakeClock>>,
    pub bus: Arc<EventBus>,
    pub worker: Arc<SimulatedDeviceWorker>,
    pub engine: Arc<ExecutionEngine<FakeClock>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Harness whose simulated devices take `delay` per execution.
    pub fn with_delay(delay: Duration) -> Self {
        let clock = FakeClock::new();
        let registry = Arc::new(JobRegistry::new(clock.clone(), DEFAULT_HISTORY_LIMIT));
        let bus = Arc::new(EventBus::new());
        let worker = Arc::new(SimulatedDeviceWorker::new(delay));
        let engine = Arc::new(ExecutionEngine::new(
            Arc::clone(&registry),
            Arc::clone(&bus),
            Arc::clone(&worker) as Arc<dyn DeviceWorker>,
            clock,
        ));
        Self { registry, bus, worker, engine }
    }

    /// Create a job targeting `hosts`, first entry as canary.
    pub fn create_job(&self, hosts: &[&str]) -> JobRecord {
        let inventory: Vec<DeviceProfile> = hosts.iter().map(|h| profile(h)).collect();
        self.registry.create(nr_core::test_support::spec(hosts), &inventory).unwrap()
    }

    /// Event `(type, device, status)` triples for assertion.
    pub fn event_rows(&self, job_id: JobId) -> Vec<(String, Option<String>, Option<String>)> {
        self.bus
            .list(job_id, 0)
            .into_iter()
            .map(|e| {
                (e.event_type.to_string(), e.device.map(|d| d.as_str().to_string()), e.status)
            })
            .collect()
    }

    /// Poll until some event row matches, or panic after two seconds.
    pub async fn wait_for_event(
        &self,
        job_id: JobId,
        mut matches: impl FnMut(&nr_core::ExecutionEvent) -> bool,
    ) {
        for _ in 0..100 {
            if self.bus.list(job_id, 0).iter().any(&mut matches) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("timed out waiting for event on {job_id}");
    }
}

pub fn key(host: &str) -> DeviceKey {
    DeviceTarget::new(host, 22).key()
}

/// Run settings used by most scenarios.
pub fn run_config(concurrency: usize, stop_on_error: bool, retry: u32) -> RunConfig {
    RunConfig {
        concurrency_limit: concurrency,
        stagger_delay_ms: 0,
        stop_on_error,
        non_canary_retry_limit: retry,
        retry_backoff_ms: 0,
    }
}
