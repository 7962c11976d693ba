// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responses from the daemon to clients.

use crate::types::{FailedRowEntry, JobSummary};
use nr_core::{DeviceProfile, ExecutionEvent, JobId, JobRecord, JobStatus};
use serde::{Deserialize, Serialize};

/// Classifies an error for the client's exit/status handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input.
    Invalid,
    /// State does not permit the operation.
    Conflict,
    NotFound,
    Internal,
}

nr_core::simple_display! {
    ErrorKind {
        Invalid => "invalid",
        Conflict => "conflict",
        NotFound => "not_found",
        Internal => "internal",
    }
}

/// Response from daemon to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Generic success.
    Ok,

    /// Health check response.
    Pong,

    /// Version handshake response.
    Hello { version: String },

    /// Daemon is shutting down.
    ShuttingDown,

    /// Error response.
    Error { kind: ErrorKind, message: String },

    /// Import outcome: every parsed device with its validation result,
    /// plus rows that failed to parse.
    ImportResult {
        devices: Vec<DeviceProfile>,
        failed_rows: Vec<FailedRowEntry>,
    },

    /// Current inventory.
    Devices { devices: Vec<DeviceProfile> },

    /// Job was created.
    JobCreated { job_id: JobId, status: JobStatus },

    /// Full job record.
    Job { job: Box<JobRecord> },

    /// Job history entries, newest first.
    Jobs { jobs: Vec<JobSummary> },

    /// Active job lock state.
    ActiveJob { job: Option<JobSummary> },

    /// Background run launched.
    RunStarted { job_id: JobId },

    /// Synchronous run finished with a terminal status.
    RunFinished { job_id: JobId, status: JobStatus },

    /// Buffered events.
    Events { events: Vec<ExecutionEvent> },

    /// One streamed event frame (Watch).
    Event { event: ExecutionEvent },

    /// Status command transcript.
    CommandOutput { output: String },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error { kind, message: message.into() }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
