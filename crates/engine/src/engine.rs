// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canary-first execution of one job.
//!
//! The engine drives a job from RUNNING to a terminal status: the canary
//! runs strictly first with no retry, and only its success opens the
//! fan-out to the remaining devices under the concurrency cap. The engine
//! publishes every event itself; workers return tagged results and never
//! touch the bus.

use crate::bus::EventBus;
use crate::error::EngineError;
use crate::registry::JobRegistry;
use nr_core::control::PAUSE_POLL;
use nr_core::{
    Clock, DeviceExecutionResult, DeviceKey, DeviceStatus, ExecutionEvent, JobControl, JobEvent,
    JobId, JobRecord, JobStatus, RunConfig, WorkStatus,
};
use nr_worker::{DeviceWorker, WorkRequest};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Synthetic failure message when the canary is outside the device set.
const CANARY_NOT_IN_TARGETS: &str = "Canary is not part of target devices";

/// Orchestrates job execution against an injected worker.
pub struct ExecutionEngine<C: Clock> {
    registry: Arc<JobRegistry<C>>,
    bus: Arc<EventBus>,
    worker: Arc<dyn DeviceWorker>,
    clock: C,
}

impl<C: Clock + 'static> ExecutionEngine<C> {
    pub fn new(
        registry: Arc<JobRegistry<C>>,
        bus: Arc<EventBus>,
        worker: Arc<dyn DeviceWorker>,
        clock: C,
    ) -> Self {
        Self { registry, bus, worker, clock }
    }

    /// Run a job to a terminal status.
    ///
    /// Any unanticipated internal failure is contained here: the job is
    /// transitioned to FAILED with a completion timestamp and a final
    /// `job_complete=failed` event is still emitted.
    pub async fn run_job(&self, job_id: JobId, config: RunConfig) -> Result<JobStatus, EngineError> {
        config.validate()?;
        // Start transition happens before containment: a job that cannot
        // start (not found, already terminal) is the caller's error.
        self.registry.apply_event(job_id, JobEvent::Start)?;
        self.publish(ExecutionEvent::job_status(job_id, JobStatus::Running, self.now())).await;

        match self.run_started_job(job_id, &config).await {
            Ok(status) => Ok(status),
            Err(e) => {
                error!(job_id = %job_id, error = %e, "engine failure, failing job");
                let status = self.finalize(job_id, JobEvent::Fail).await;
                Ok(status.unwrap_or(JobStatus::Failed))
            }
        }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.utc_now()
    }

    async fn publish(&self, event: ExecutionEvent) {
        self.bus.publish(event).await;
    }

    /// Apply a terminal lifecycle event and emit `job_complete`.
    ///
    /// A pause that lands after the last device finished cannot hold the
    /// job open: the engine resumes and retries the terminal event. Any
    /// other rejected transition means someone else already finalized the
    /// job (redundant finalization); no second `job_complete` is emitted.
    async fn finalize(&self, job_id: JobId, event: JobEvent) -> Option<JobStatus> {
        let applied = self.registry.apply_event(job_id, event).or_else(|first_err| {
            let paused = self
                .registry
                .get(job_id)
                .map(|j| j.status == JobStatus::Paused)
                .unwrap_or(false);
            if paused && event != JobEvent::Cancel {
                self.registry.apply_event(job_id, JobEvent::Resume)?;
                self.registry.apply_event(job_id, event)
            } else {
                Err(first_err)
            }
        });
        match applied {
            Ok(job) => {
                info!(job_id = %job_id, status = %job.status, "job finished");
                self.publish(ExecutionEvent::job_complete(job_id, job.status, self.now())).await;
                Some(job.status)
            }
            Err(e) => {
                warn!(job_id = %job_id, event = %event, error = %e, "redundant finalization");
                None
            }
        }
    }

    /// Sleep through a pause, re-checking at the poll interval.
    /// Returns `false` when cancel latched during (or before) the wait.
    async fn gate_pause(&self, control: &JobControl) -> bool {
        while control.is_paused() && !control.is_cancelled() {
            tokio::time::sleep(PAUSE_POLL).await;
        }
        !control.is_cancelled()
    }

    fn build_request(
        job: &JobRecord,
        key: &DeviceKey,
        is_canary: bool,
        control: Arc<JobControl>,
    ) -> Result<WorkRequest, EngineError> {
        let params = job
            .device_params
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::MissingDeviceResult(key.clone()))?;
        Ok(WorkRequest {
            device: params.target(),
            verify_cmds: job.verify_cmds_for(&params, is_canary),
            params,
            commands: job.command_list(),
            is_canary,
            retry_on_connection_error: !is_canary,
            control,
        })
    }

    /// Fold one worker outcome into the job and publish its events:
    /// a `log` event per captured line, then the terminal `device_status`.
    async fn apply_device_outcome(
        &self,
        job_id: JobId,
        key: &DeviceKey,
        outcome: DeviceExecutionResult,
    ) -> Result<DeviceStatus, EngineError> {
        let status: DeviceStatus = outcome.status.into();
        let message = outcome.error.clone();
        let logs = outcome.logs.clone();
        let now = self.now();
        self.registry.update_device_result(job_id, key, |r| {
            r.apply_outcome(outcome, now);
        })?;

        for line in logs {
            self.publish(ExecutionEvent::log(job_id, key.clone(), line, self.now())).await;
        }
        self.publish(ExecutionEvent::device_status(job_id, key.clone(), status, message, self.now()))
            .await;
        Ok(status)
    }

    /// Transition one device to RUNNING and announce it.
    async fn admit_device(&self, job_id: JobId, key: &DeviceKey) -> Result<(), EngineError> {
        let now = self.now();
        self.registry.update_device_result(job_id, key, |r| {
            r.mark_running(now);
        })?;
        self.publish(ExecutionEvent::device_status(
            job_id,
            key.clone(),
            DeviceStatus::Running,
            None,
            self.now(),
        ))
        .await;
        Ok(())
    }

    /// Cancel every still-pending device (no events: they never ran) and
    /// finalize the job as cancelled.
    async fn cancel_job(&self, job_id: JobId) -> Result<JobStatus, EngineError> {
        self.registry.cancel_pending_devices(job_id)?;
        Ok(self.finalize(job_id, JobEvent::Cancel).await.unwrap_or(JobStatus::Cancelled))
    }

    async fn run_started_job(
        &self,
        job_id: JobId,
        config: &RunConfig,
    ) -> Result<JobStatus, EngineError> {
        let job = self.registry.get(job_id)?;
        let control = self.registry.control(job_id)?;

        if control.is_cancelled() {
            return self.cancel_job(job_id).await;
        }

        // Preconditions: the canary must be part of the device set.
        let canary_key = job.canary.key();
        if job.device_results.is_empty() || !job.device_results.contains_key(&canary_key) {
            self.registry.record_canary_failure(job_id, CANARY_NOT_IN_TARGETS)?;
            self.publish(ExecutionEvent::device_status(
                job_id,
                canary_key,
                DeviceStatus::Failed,
                Some(CANARY_NOT_IN_TARGETS.to_string()),
                self.now(),
            ))
            .await;
            return Ok(self.finalize(job_id, JobEvent::Fail).await.unwrap_or(JobStatus::Failed));
        }

        // Canary phase: strictly sequential, no retry.
        self.admit_device(job_id, &canary_key).await?;
        if !self.gate_pause(&control).await {
            // Cancelled while waiting: the canary never executed.
            let now = self.now();
            self.registry.update_device_result(job_id, &canary_key, |r| {
                r.mark_cancelled(now);
            })?;
            self.publish(ExecutionEvent::device_status(
                job_id,
                canary_key,
                DeviceStatus::Cancelled,
                None,
                self.now(),
            ))
            .await;
            return self.cancel_job(job_id).await;
        }

        let request = Self::build_request(&job, &canary_key, true, Arc::clone(&control))?;
        let outcome = self.worker.run(request).await;
        let canary_status = self.apply_device_outcome(job_id, &canary_key, outcome).await?;

        match canary_status {
            DeviceStatus::Success => {}
            DeviceStatus::Cancelled => {
                control.cancel();
                return self.cancel_job(job_id).await;
            }
            _ => {
                info!(job_id = %job_id, canary = %canary_key, "canary failed, aborting fan-out");
                return Ok(self.finalize(job_id, JobEvent::Fail).await.unwrap_or(JobStatus::Failed));
            }
        }

        // Fan-out phase.
        let pending: VecDeque<DeviceKey> =
            job.device_results.keys().filter(|k| **k != canary_key).cloned().collect();
        if pending.is_empty() {
            return Ok(self
                .finalize(job_id, JobEvent::Complete)
                .await
                .unwrap_or(JobStatus::Completed));
        }

        let cancel_observed = self.fan_out(job_id, &job, &control, config, pending).await?;

        // Final status: CANCELLED whenever cancel was observed; FAILED only
        // when at least one device result is FAILED.
        if cancel_observed || control.is_cancelled() {
            return self.cancel_job(job_id).await;
        }
        let finished = self.registry.get(job_id)?;
        let any_failed =
            finished.device_results.values().any(|r| r.status == DeviceStatus::Failed);
        let all_success = finished
            .device_results
            .values()
            .all(|r| matches!(r.status, DeviceStatus::Success | DeviceStatus::Cancelled));
        let event = if any_failed {
            JobEvent::Fail
        } else if all_success {
            JobEvent::Complete
        } else {
            JobEvent::Cancel
        };
        let fallback = match event {
            JobEvent::Fail => JobStatus::Failed,
            JobEvent::Complete => JobStatus::Completed,
            _ => JobStatus::Cancelled,
        };
        if event == JobEvent::Cancel {
            self.registry.cancel_pending_devices(job_id)?;
        }
        Ok(self.finalize(job_id, event).await.unwrap_or(fallback))
    }

    /// Admission/completion loop over the non-canary devices.
    ///
    /// Returns whether cancellation was observed. Pending devices left
    /// unadmitted are marked CANCELLED without events by the caller or
    /// within this loop's drain.
    async fn fan_out(
        &self,
        job_id: JobId,
        job: &JobRecord,
        control: &Arc<JobControl>,
        config: &RunConfig,
        mut pending: VecDeque<DeviceKey>,
    ) -> Result<bool, EngineError> {
        let mut in_flight: JoinSet<(DeviceKey, DeviceExecutionResult)> = JoinSet::new();
        let mut cancel_observed = false;
        let mut stop_admission = false;

        loop {
            // Pause gate: re-evaluated before every scheduling step.
            if !self.gate_pause(control).await {
                cancel_observed = true;
            }
            if cancel_observed || control.is_cancelled() {
                cancel_observed = true;
                stop_admission = true;
            }
            if !stop_admission
                && config.stop_on_error
                && self.any_completed_non_success(job_id)?
            {
                stop_admission = true;
            }

            if !stop_admission {
                while in_flight.len() < config.concurrency_limit && !pending.is_empty() {
                    if control.is_cancelled() {
                        cancel_observed = true;
                        stop_admission = true;
                        break;
                    }
                    if config.stop_on_error && self.any_completed_non_success(job_id)? {
                        stop_admission = true;
                        break;
                    }
                    let key = match pending.pop_front() {
                        Some(key) => key,
                        None => break,
                    };
                    self.admit_device(job_id, &key).await?;
                    let request =
                        Self::build_request(job, &key, false, Arc::clone(control))?;
                    let worker = Arc::clone(&self.worker);
                    let retry_limit = config.non_canary_retry_limit;
                    let backoff = config.retry_backoff();
                    in_flight.spawn(async move {
                        let result = run_with_retry(worker, request, retry_limit, backoff).await;
                        (key, result)
                    });
                    if !config.stagger_delay().is_zero() && !pending.is_empty() {
                        tokio::time::sleep(config.stagger_delay()).await;
                    }
                }
            }

            if in_flight.is_empty() {
                if stop_admission || pending.is_empty() {
                    break;
                }
                continue;
            }

            // Wait for at least one in-flight task before re-evaluating.
            match in_flight.join_next().await {
                Some(Ok((key, outcome))) => {
                    let status = self.apply_device_outcome(job_id, &key, outcome).await?;
                    if status == DeviceStatus::Cancelled {
                        // Worker-reported cancellation is a cancel signal
                        // even when the flag was not set beforehand.
                        control.cancel();
                        cancel_observed = true;
                        stop_admission = true;
                    }
                }
                Some(Err(e)) => {
                    error!(job_id = %job_id, error = %e, "device task aborted");
                }
                None => {}
            }

            if stop_admission && in_flight.is_empty() {
                break;
            }
        }

        // Drain: already-admitted tasks are allowed to finish; they observe
        // cancel at their own checkpoints.
        while let Some(res) = in_flight.join_next().await {
            match res {
                Ok((key, outcome)) => {
                    let status = self.apply_device_outcome(job_id, &key, outcome).await?;
                    if status == DeviceStatus::Cancelled {
                        cancel_observed = true;
                    }
                }
                Err(e) => error!(job_id = %job_id, error = %e, "device task aborted"),
            }
        }

        // Never-admitted devices: cancelled without a RUNNING transition.
        if !pending.is_empty() {
            let now = self.now();
            for key in pending {
                self.registry.update_device_result(job_id, &key, |r| {
                    r.mark_cancelled(now);
                })?;
            }
        }

        Ok(cancel_observed || control.is_cancelled())
    }

    fn any_completed_non_success(&self, job_id: JobId) -> Result<bool, EngineError> {
        let job = self.registry.get(job_id)?;
        Ok(job
            .device_results
            .values()
            .any(|r| r.status.is_terminal() && r.status != DeviceStatus::Success))
    }
}

/// Execute with retry for non-canary devices.
///
/// Retries only failed attempts, sleeping `backoff` between them; a
/// cancelled attempt returns immediately. `attempts` reflects the number
/// of worker invocations made.
pub(crate) async fn run_with_retry(
    worker: Arc<dyn DeviceWorker>,
    request: WorkRequest,
    retry_limit: u32,
    backoff: Duration,
) -> DeviceExecutionResult {
    let mut last = None;
    for attempt in 0..=retry_limit {
        if request.control.is_cancelled() {
            let mut result = DeviceExecutionResult::cancelled("Execution cancelled");
            result.attempts = attempt + 1;
            return result;
        }
        let mut result = worker.run(request.clone()).await;
        result.attempts = attempt + 1;
        match result.status {
            WorkStatus::Success | WorkStatus::Cancelled => return result,
            WorkStatus::Failed => {
                let is_last = attempt == retry_limit;
                if !is_last && !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
                last = Some(result);
            }
        }
    }
    last.unwrap_or_else(|| DeviceExecutionResult::failed("No execution result"))
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
