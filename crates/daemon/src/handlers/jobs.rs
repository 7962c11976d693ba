// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle handlers.

use super::engine_error;
use crate::ctx::DaemonCtx;
use nr_core::{Clock, ExecutionEvent, JobEvent, JobId, JobSpec, RunConfig};
use nr_wire::{ErrorKind, JobSummary, Response, RunOverrides};
use std::sync::Arc;
use tracing::info;

pub(crate) fn create(ctx: &Arc<DaemonCtx>, spec: JobSpec) -> Response {
    match ctx.registry.create(spec, &ctx.store.list()) {
        Ok(job) => {
            info!(job_id = %job.job_id, devices = job.device_results.len(), "job created");
            Response::JobCreated { job_id: job.job_id, status: job.status }
        }
        Err(e) => engine_error(e),
    }
}

pub(crate) fn get(ctx: &Arc<DaemonCtx>, job_id: JobId) -> Response {
    match ctx.registry.get(job_id) {
        Ok(job) => Response::Job { job: Box::new(job) },
        Err(e) => engine_error(e),
    }
}

pub(crate) fn list(ctx: &Arc<DaemonCtx>) -> Response {
    let now = ctx.clock.utc_now();
    let jobs = ctx.registry.list().iter().map(|j| JobSummary::from_record(j, now)).collect();
    Response::Jobs { jobs }
}

pub(crate) fn active(ctx: &Arc<DaemonCtx>) -> Response {
    let now = ctx.clock.utc_now();
    Response::ActiveJob { job: ctx.registry.active().map(|j| JobSummary::from_record(&j, now)) }
}

pub(crate) fn events(ctx: &Arc<DaemonCtx>, job_id: JobId, start_index: usize) -> Response {
    if let Err(e) = ctx.registry.get(job_id) {
        return engine_error(e);
    }
    Response::Events { events: ctx.bus.list(job_id, start_index) }
}

/// Launch a run, optionally waiting for the terminal status.
///
/// Both paths go through the coordinator so at most one runner per job is
/// ever live; the synchronous path just awaits the runner's outcome.
pub(crate) async fn run(
    ctx: &Arc<DaemonCtx>,
    job_id: JobId,
    overrides: RunOverrides,
    wait: bool,
) -> Response {
    let job = match ctx.registry.get(job_id) {
        Ok(job) => job,
        Err(e) => return engine_error(e),
    };
    if job.is_terminal() {
        return Response::error(ErrorKind::Conflict, format!("job {job_id} is {}", job.status));
    }
    let config = overrides.apply(RunConfig::from_job(&job));
    if let Err(e) = config.validate() {
        return Response::error(ErrorKind::Invalid, e.to_string());
    }

    let engine = Arc::clone(&ctx.engine);
    let (tx, rx) = tokio::sync::oneshot::channel();
    let started = ctx.coordinator.start(job_id, async move {
        let outcome = engine.run_job(job_id, config).await;
        let _ = tx.send(outcome);
    });
    if !started {
        return Response::error(ErrorKind::Conflict, format!("job {job_id} is already running"));
    }

    if !wait {
        return Response::RunStarted { job_id };
    }
    match rx.await {
        Ok(Ok(status)) => Response::RunFinished { job_id, status },
        Ok(Err(e)) => engine_error(e),
        Err(_) => Response::error(ErrorKind::Internal, "runner dropped without a result"),
    }
}

pub(crate) async fn pause(ctx: &Arc<DaemonCtx>, job_id: JobId) -> Response {
    let control = match ctx.registry.control(job_id) {
        Ok(control) => control,
        Err(e) => return engine_error(e),
    };
    match ctx.registry.apply_event(job_id, JobEvent::Pause) {
        Ok(job) => {
            control.pause();
            info!(job_id = %job_id, "job paused");
            ctx.bus
                .publish(ExecutionEvent::job_status(job_id, job.status, ctx.clock.utc_now()))
                .await;
            Response::Ok
        }
        Err(e) => engine_error(e),
    }
}

pub(crate) async fn resume(ctx: &Arc<DaemonCtx>, job_id: JobId) -> Response {
    let control = match ctx.registry.control(job_id) {
        Ok(control) => control,
        Err(e) => return engine_error(e),
    };
    match ctx.registry.apply_event(job_id, JobEvent::Resume) {
        Ok(job) => {
            control.resume();
            info!(job_id = %job_id, "job resumed");
            ctx.bus
                .publish(ExecutionEvent::job_status(job_id, job.status, ctx.clock.utc_now()))
                .await;
            Response::Ok
        }
        Err(e) => engine_error(e),
    }
}

/// Cancel a job.
///
/// With a live runner the engine observes the latched signal and
/// finalizes; without one (queued, or paused before any run) the job is
/// finalized here so the stream still terminates with `job_complete`.
pub(crate) async fn cancel(ctx: &Arc<DaemonCtx>, job_id: JobId) -> Response {
    let job = match ctx.registry.get(job_id) {
        Ok(job) => job,
        Err(e) => return engine_error(e),
    };
    if job.is_terminal() {
        return Response::error(ErrorKind::Conflict, "job already completed");
    }
    let control = match ctx.registry.control(job_id) {
        Ok(control) => control,
        Err(e) => return engine_error(e),
    };
    control.cancel();
    info!(job_id = %job_id, "cancel requested");

    if !ctx.coordinator.is_running(job_id) {
        if let Ok(cancelled) = ctx.registry.apply_event(job_id, JobEvent::Cancel) {
            let _ = ctx.registry.cancel_pending_devices(job_id);
            ctx.bus
                .publish(ExecutionEvent::job_complete(
                    job_id,
                    cancelled.status,
                    ctx.clock.utc_now(),
                ))
                .await;
        }
    }
    Response::Ok
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
