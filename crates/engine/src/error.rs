// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy.

use nr_core::{DeviceKey, InvalidTransition, JobId, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// At most one job may be queued, running, or paused at a time.
    #[error("job {0} is already active")]
    ActiveJobConflict(JobId),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A requested target is absent from the current inventory.
    #[error("unknown device: {0}")]
    UnknownDevice(DeviceKey),

    #[error("no devices provided or imported")]
    NoDevices,

    /// Internal inconsistency: a device key without a result record.
    #[error("missing device result: {0}")]
    MissingDeviceResult(DeviceKey),
}
