// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thread-safe job store.
//!
//! The registry holds the only mutable authority over job records. All
//! mutation happens under one coarse lock, so device-result updates are
//! atomic with reads from `get`. Jobs are retained after terminal states
//! in a bounded history; the oldest terminal jobs are evicted first.

use crate::error::EngineError;
use indexmap::IndexMap;
use nr_core::{
    Clock, DeviceKey, DeviceParams, DeviceProfile, DeviceResult, JobControl, JobEvent, JobId,
    JobRecord, JobSpec, JobStatus,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct RegistryState {
    /// Insertion order is creation order.
    jobs: IndexMap<JobId, JobRecord>,
    controls: HashMap<JobId, Arc<JobControl>>,
}

/// In-memory job registry with a single-active-job guard.
pub struct JobRegistry<C: Clock> {
    clock: C,
    history_limit: usize,
    state: Mutex<RegistryState>,
}

impl<C: Clock> JobRegistry<C> {
    pub fn new(clock: C, history_limit: usize) -> Self {
        Self { clock, history_limit, state: Mutex::new(RegistryState::default()) }
    }

    /// Create a job in QUEUED, snapshotting device params from the given
    /// inventory.
    ///
    /// Refuses creation while another job is active, and when a requested
    /// target is absent from the inventory.
    pub fn create(
        &self,
        spec: JobSpec,
        inventory: &[DeviceProfile],
    ) -> Result<JobRecord, EngineError> {
        spec.validate()?;

        let targets = if spec.devices.is_empty() {
            inventory.iter().map(|d| d.target()).collect::<Vec<_>>()
        } else {
            spec.devices.clone()
        };
        if targets.is_empty() {
            return Err(EngineError::NoDevices);
        }

        let by_key: HashMap<DeviceKey, &DeviceProfile> =
            inventory.iter().map(|d| (d.key(), d)).collect();

        let mut device_results = IndexMap::new();
        let mut device_params = HashMap::new();
        for target in &targets {
            let key = target.key();
            let profile = by_key
                .get(&key)
                .copied()
                .ok_or_else(|| EngineError::UnknownDevice(key.clone()))?;
            device_params.insert(key.clone(), DeviceParams::snapshot(profile, &spec.verify_cmds));
            device_results.insert(key, DeviceResult::queued(target));
        }

        let mut state = self.state.lock();
        if let Some(active) = state.jobs.values().find(|j| j.status.is_active()) {
            return Err(EngineError::ActiveJobConflict(active.job_id));
        }

        let job = JobRecord {
            job_id: JobId::new(),
            job_name: spec.job_name,
            creator: spec.creator,
            status: JobStatus::Queued,
            created_at: self.clock.utc_now(),
            started_at: None,
            completed_at: None,
            canary: spec.canary,
            commands: spec.commands,
            verify_mode: spec.verify_mode,
            verify_cmds: spec.verify_cmds,
            concurrency_limit: spec.concurrency_limit,
            stagger_delay_ms: spec.stagger_delay_ms,
            stop_on_error: spec.stop_on_error,
            device_results,
            device_params,
        };
        state.controls.insert(job.job_id, Arc::new(JobControl::new()));
        state.jobs.insert(job.job_id, job.clone());
        Ok(job)
    }

    pub fn get(&self, job_id: JobId) -> Result<JobRecord, EngineError> {
        self.state
            .lock()
            .jobs
            .get(&job_id)
            .cloned()
            .ok_or(EngineError::JobNotFound(job_id))
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<JobRecord> {
        self.state.lock().jobs.values().rev().cloned().collect()
    }

    /// The newest non-terminal job, if any.
    pub fn active(&self) -> Option<JobRecord> {
        self.state.lock().jobs.values().rev().find(|j| j.status.is_active()).cloned()
    }

    /// Per-job control handle.
    pub fn control(&self, job_id: JobId) -> Result<Arc<JobControl>, EngineError> {
        self.state
            .lock()
            .controls
            .get(&job_id)
            .cloned()
            .ok_or(EngineError::JobNotFound(job_id))
    }

    /// Apply a lifecycle event through the state machine.
    ///
    /// Sets `started_at` on the first start and `completed_at` on any
    /// terminal destination, then enforces history retention.
    pub fn apply_event(&self, job_id: JobId, event: JobEvent) -> Result<JobRecord, EngineError> {
        let now = self.clock.utc_now();
        let mut state = self.state.lock();
        let job = state.jobs.get_mut(&job_id).ok_or(EngineError::JobNotFound(job_id))?;

        let next = job.status.apply(event)?;
        job.status = next;
        if event == JobEvent::Start && job.started_at.is_none() {
            job.started_at = Some(now);
        }
        if next.is_terminal() {
            job.completed_at = Some(now);
        }
        let updated = job.clone();

        if next.is_terminal() {
            Self::evict_history(&mut state, self.history_limit);
        }
        Ok(updated)
    }

    /// Mutate one device result atomically, returning the updated copy.
    pub fn update_device_result(
        &self,
        job_id: JobId,
        key: &DeviceKey,
        f: impl FnOnce(&mut DeviceResult),
    ) -> Result<DeviceResult, EngineError> {
        let mut state = self.state.lock();
        let job = state.jobs.get_mut(&job_id).ok_or(EngineError::JobNotFound(job_id))?;
        let result = job
            .device_results
            .get_mut(key)
            .ok_or_else(|| EngineError::MissingDeviceResult(key.clone()))?;
        f(result);
        Ok(result.clone())
    }

    /// Insert or overwrite a synthetic failed result for a canary that is
    /// not part of the job's device set.
    pub fn record_canary_failure(
        &self,
        job_id: JobId,
        message: &str,
    ) -> Result<DeviceResult, EngineError> {
        let now = self.clock.utc_now();
        let mut state = self.state.lock();
        let job = state.jobs.get_mut(&job_id).ok_or(EngineError::JobNotFound(job_id))?;
        let key = job.canary.key();
        let mut result = DeviceResult::queued(&job.canary);
        result.status = nr_core::DeviceStatus::Failed;
        result.error = Some(message.to_string());
        result.completed_at = Some(now);
        job.device_results.insert(key, result.clone());
        Ok(result)
    }

    /// Mark every non-terminal device result cancelled, without events.
    /// Returns the keys that changed.
    pub fn cancel_pending_devices(&self, job_id: JobId) -> Result<Vec<DeviceKey>, EngineError> {
        let now = self.clock.utc_now();
        let mut state = self.state.lock();
        let job = state.jobs.get_mut(&job_id).ok_or(EngineError::JobNotFound(job_id))?;
        let mut changed = Vec::new();
        for (key, result) in job.device_results.iter_mut() {
            if result.mark_cancelled(now) {
                changed.push(key.clone());
            }
        }
        Ok(changed)
    }

    fn evict_history(state: &mut RegistryState, history_limit: usize) {
        let terminal: usize = state.jobs.values().filter(|j| j.is_terminal()).count();
        if terminal <= history_limit {
            return;
        }
        let mut evictable: Vec<(JobId, Option<chrono::DateTime<chrono::Utc>>)> = state
            .jobs
            .values()
            .filter(|j| j.is_terminal())
            .map(|j| (j.job_id, j.completed_at))
            .collect();
        evictable.sort_by_key(|(_, completed_at)| *completed_at);
        for (job_id, _) in evictable.into_iter().take(terminal - history_limit) {
            state.jobs.shift_remove(&job_id);
            state.controls.remove(&job_id);
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
