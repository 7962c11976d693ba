// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request handlers.
//!
//! Every handler returns a [`Response`]; streaming (`Watch`) and
//! connection control (`Shutdown`) live in the listener.

mod devices;
mod jobs;

use crate::ctx::DaemonCtx;
use nr_engine::EngineError;
use nr_wire::{ErrorKind, Request, Response};
use std::sync::Arc;

/// Map an engine error onto a protocol error response.
pub(crate) fn engine_error(e: EngineError) -> Response {
    let kind = match e {
        EngineError::JobNotFound(_) => ErrorKind::NotFound,
        EngineError::ActiveJobConflict(_) | EngineError::Transition(_) => ErrorKind::Conflict,
        EngineError::Validation(_) | EngineError::UnknownDevice(_) | EngineError::NoDevices => {
            ErrorKind::Invalid
        }
        EngineError::MissingDeviceResult(_) => ErrorKind::Internal,
    };
    Response::error(kind, e.to_string())
}

/// Handle one non-streaming request.
pub async fn dispatch(ctx: &Arc<DaemonCtx>, request: Request) -> Response {
    match request {
        Request::Hello { .. } => {
            Response::Hello { version: crate::env::PROTOCOL_VERSION.to_string() }
        }
        Request::Ping => Response::Pong,

        Request::ImportDevices { csv } => devices::import(ctx, csv).await,
        Request::ListDevices => Response::Devices { devices: ctx.store.list() },
        Request::StatusCommand { device, commands } => {
            devices::status_command(ctx, device, commands).await
        }

        Request::CreateJob { spec } => jobs::create(ctx, spec),
        Request::GetJob { job_id } => jobs::get(ctx, job_id),
        Request::ListJobs => jobs::list(ctx),
        Request::ActiveJob => jobs::active(ctx),
        Request::RunJob { job_id, run, wait } => jobs::run(ctx, job_id, run, wait).await,
        Request::PauseJob { job_id } => jobs::pause(ctx, job_id).await,
        Request::ResumeJob { job_id } => jobs::resume(ctx, job_id).await,
        Request::CancelJob { job_id } => jobs::cancel(ctx, job_id).await,
        Request::Events { job_id, start_index } => jobs::events(ctx, job_id, start_index),

        // Handled by the listener; reaching here is a protocol misuse.
        Request::Watch { .. } | Request::Shutdown => {
            Response::error(ErrorKind::Invalid, "streaming request on plain path")
        }
    }
}
