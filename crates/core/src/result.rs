// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device outcomes: the worker's tagged result and the record the
//! registry keeps for each device in a job.

use crate::device::DeviceTarget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of one device within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Queued,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl DeviceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeviceStatus::Success | DeviceStatus::Failed | DeviceStatus::Cancelled)
    }
}

crate::simple_display! {
    DeviceStatus {
        Queued => "queued",
        Running => "running",
        Success => "success",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Tagged outcome a worker reports for one execution attempt.
///
/// Workers never publish events or raise for expected failures; SSH-layer
/// errors are translated into `Failed` results at the worker boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Success,
    Failed,
    Cancelled,
}

crate::simple_display! {
    WorkStatus {
        Success => "success",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl From<WorkStatus> for DeviceStatus {
    fn from(s: WorkStatus) -> Self {
        match s {
            WorkStatus::Success => DeviceStatus::Success,
            WorkStatus::Failed => DeviceStatus::Failed,
            WorkStatus::Cancelled => DeviceStatus::Cancelled,
        }
    }
}

/// Result of executing the command block on one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceExecutionResult {
    pub status: WorkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub log_trimmed: bool,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

fn default_attempts() -> u32 {
    1
}

impl DeviceExecutionResult {
    pub fn success() -> Self {
        Self::with_status(WorkStatus::Success, None)
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::with_status(WorkStatus::Failed, Some(error.into()))
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::with_status(WorkStatus::Cancelled, Some(message.into()))
    }

    fn with_status(status: WorkStatus, error: Option<String>) -> Self {
        Self {
            status,
            error,
            pre_output: None,
            apply_output: None,
            post_output: None,
            diff: None,
            logs: Vec::new(),
            log_trimmed: false,
            attempts: 1,
        }
    }
}

/// Per-device record stored on the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceResult {
    pub host: String,
    pub port: u16,
    pub status: DeviceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub log_trimmed: bool,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl DeviceResult {
    /// Fresh queued record for one target.
    pub fn queued(target: &DeviceTarget) -> Self {
        Self {
            host: target.host.clone(),
            port: target.port,
            status: DeviceStatus::Queued,
            error: None,
            pre_output: None,
            apply_output: None,
            post_output: None,
            diff: None,
            logs: Vec::new(),
            log_trimmed: false,
            attempts: 0,
            started_at: None,
            completed_at: None,
        }
    }

    /// Mark the device running. No-op when a terminal status is already set.
    pub fn mark_running(&mut self, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = DeviceStatus::Running;
        self.started_at = Some(now);
        true
    }

    /// Mark a queued device cancelled without running it.
    /// No-op when a terminal status is already set.
    pub fn mark_cancelled(&mut self, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = DeviceStatus::Cancelled;
        self.completed_at = Some(now);
        true
    }

    /// Fold a worker result into the record.
    ///
    /// Terminal status is set exactly once: once terminal, later outcomes
    /// are ignored.
    pub fn apply_outcome(&mut self, outcome: DeviceExecutionResult, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = outcome.status.into();
        self.error = outcome.error;
        self.pre_output = outcome.pre_output;
        self.apply_output = outcome.apply_output;
        self.post_output = outcome.post_output;
        self.diff = outcome.diff;
        self.logs = outcome.logs;
        self.log_trimmed = outcome.log_trimmed;
        self.attempts = outcome.attempts;
        self.completed_at = Some(now);
        true
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
