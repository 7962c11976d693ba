// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests from clients to the daemon.

use nr_core::{DeviceTarget, JobId, JobSpec, RunConfig};
use serde::{Deserialize, Serialize};

/// Per-run overrides applied on top of the job's stored knobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagger_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_on_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_canary_retry_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_backoff_ms: Option<u64>,
}

impl RunOverrides {
    pub fn apply(&self, mut base: RunConfig) -> RunConfig {
        if let Some(v) = self.concurrency_limit {
            base.concurrency_limit = v;
        }
        if let Some(v) = self.stagger_delay_ms {
            base.stagger_delay_ms = v;
        }
        if let Some(v) = self.stop_on_error {
            base.stop_on_error = v;
        }
        if let Some(v) = self.non_canary_retry_limit {
            base.non_canary_retry_limit = v;
        }
        if let Some(v) = self.retry_backoff_ms {
            base.retry_backoff_ms = v;
        }
        base
    }
}

/// Request from client to daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Version handshake.
    Hello { version: String },

    /// Health check.
    Ping,

    /// Ask the daemon to exit.
    Shutdown,

    /// Import devices from CSV content, replacing the inventory.
    ImportDevices { csv: String },

    /// List the current inventory.
    ListDevices,

    /// Create a job in QUEUED.
    CreateJob { spec: JobSpec },

    GetJob { job_id: JobId },

    /// Job history, newest first.
    ListJobs,

    /// The active (non-terminal) job, if any.
    ActiveJob,

    /// Run a job. `wait` blocks until a terminal status; otherwise the
    /// run continues in the background.
    RunJob {
        job_id: JobId,
        #[serde(default)]
        run: RunOverrides,
        #[serde(default)]
        wait: bool,
    },

    PauseJob { job_id: JobId },
    ResumeJob { job_id: JobId },
    CancelJob { job_id: JobId },

    /// Buffered events from `start_index`.
    Events {
        job_id: JobId,
        #[serde(default)]
        start_index: usize,
    },

    /// Stream events from `start_index` until `job_complete`.
    Watch {
        job_id: JobId,
        #[serde(default)]
        start_index: usize,
    },

    /// Run read-only exec commands on one managed device.
    StatusCommand { device: DeviceTarget, commands: String },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
