// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device inventory and status command handlers.

use crate::ctx::DaemonCtx;
use nr_core::{DeviceParams, DeviceTarget};
use nr_inventory::import_csv;
use nr_wire::{ErrorKind, FailedRowEntry, Response};
use std::sync::Arc;
use tracing::info;

/// Import CSV content, replacing the inventory with validated devices.
///
/// Connection validation may touch the network, so the whole import runs
/// on the blocking pool.
pub(crate) async fn import(ctx: &Arc<DaemonCtx>, csv: String) -> Response {
    let store = Arc::clone(&ctx.store);
    let validator = Arc::clone(&ctx.validator);
    let outcome =
        tokio::task::spawn_blocking(move || import_csv(&csv, &store, validator.as_ref())).await;

    match outcome {
        Ok(Ok(result)) => Response::ImportResult {
            devices: result.devices,
            failed_rows: result
                .failed_rows
                .into_iter()
                .map(|r| FailedRowEntry { row_number: r.row_number, error: r.error })
                .collect(),
        },
        Ok(Err(e)) => Response::error(ErrorKind::Invalid, e.to_string()),
        Err(e) => Response::error(ErrorKind::Internal, format!("import task failed: {e}")),
    }
}

/// Run read-only exec commands against one managed device.
pub(crate) async fn status_command(
    ctx: &Arc<DaemonCtx>,
    device: DeviceTarget,
    commands: String,
) -> Response {
    let Some(profile) = ctx.store.get(&device.key()) else {
        return Response::error(ErrorKind::NotFound, "Device not found");
    };
    info!(device = %device, "status command");

    let params = DeviceParams::snapshot(&profile, &[]);
    match nr_worker::run_status_command(params, commands).await {
        Ok(output) => Response::CommandOutput { output },
        Err(e @ nr_worker::StatusCommandError::Disruptive(_))
        | Err(e @ nr_worker::StatusCommandError::Empty) => {
            Response::error(ErrorKind::Invalid, e.to_string())
        }
        Err(e) => Response::error(ErrorKind::Internal, e.to_string()),
    }
}
