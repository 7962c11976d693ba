// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nr-worker: the device execution capability.
//!
//! A [`DeviceWorker`] applies a command block to one device and reports a
//! tagged [`DeviceExecutionResult`]. Workers never publish events; the
//! engine owns event publication. Two implementations ship: an ssh2-backed
//! adapter for real devices and a deterministic simulator for tests and
//! simulated deployments.

pub mod diff;
pub mod logbuf;
pub mod markers;
pub mod sim;
pub mod ssh;
pub mod status;
pub mod validate;

use async_trait::async_trait;
use nr_core::{DeviceExecutionResult, DeviceParams, DeviceTarget, JobControl};
use std::sync::Arc;
use std::time::Duration;

/// Connection timeout for device sessions.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-command read timeout.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(20);

/// Fixed backoff before the single connection retry.
pub const CONNECT_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// One device execution request.
#[derive(Debug, Clone)]
pub struct WorkRequest {
    pub device: DeviceTarget,
    pub params: DeviceParams,
    pub commands: Vec<String>,
    pub verify_cmds: Vec<String>,
    pub is_canary: bool,
    pub retry_on_connection_error: bool,
    pub control: Arc<JobControl>,
}

impl WorkRequest {
    /// Connection retries allowed for this request: canaries never retry.
    pub fn connect_retries(&self) -> u32 {
        if self.is_canary || !self.retry_on_connection_error {
            0
        } else {
            1
        }
    }
}

/// Executes commands on one device.
#[async_trait]
pub trait DeviceWorker: Send + Sync {
    async fn run(&self, request: WorkRequest) -> DeviceExecutionResult;
}

pub use sim::SimulatedDeviceWorker;
pub use ssh::SshDeviceWorker;
pub use status::{run_status_command, StatusCommandError};
pub use validate::{ConnectionValidator, SimulatedConnectionValidator, SshConnectionValidator};
