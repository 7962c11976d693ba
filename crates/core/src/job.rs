// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, lifecycle state machine, and the job aggregate.

use crate::device::{DeviceKey, DeviceParams, DeviceTarget};
use crate::error::{InvalidTransition, ValidationError};
use crate::result::DeviceResult;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a new random ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an ID from its string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Active states hold the single-active-job guard.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Apply a lifecycle event, returning the next status.
    ///
    /// The transition table is total over the valid pairs; every other
    /// pair is an [`InvalidTransition`]. Side-effect free: callers apply
    /// timestamp updates.
    pub fn apply(self, event: JobEvent) -> Result<JobStatus, InvalidTransition> {
        use JobEvent::*;
        use JobStatus::*;
        match (self, event) {
            (Queued, Start) => Ok(Running),
            (Queued, Cancel) => Ok(Cancelled),
            (Running, Pause) => Ok(Paused),
            (Running, Complete) => Ok(Completed),
            (Running, Fail) => Ok(Failed),
            (Running, Cancel) => Ok(Cancelled),
            (Paused, Resume) => Ok(Running),
            (Paused, Cancel) => Ok(Cancelled),
            (status, event) => Err(InvalidTransition { status, event }),
        }
    }

    /// Check whether an event is valid without applying it.
    pub fn can_apply(self, event: JobEvent) -> bool {
        self.apply(event).is_ok()
    }
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Running => "running",
        Paused => "paused",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Events that drive job lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobEvent {
    Start,
    Pause,
    Resume,
    Complete,
    Fail,
    Cancel,
}

crate::simple_display! {
    JobEvent {
        Start => "start",
        Pause => "pause",
        Resume => "resume",
        Complete => "complete",
        Fail => "fail",
        Cancel => "cancel",
    }
}

/// Which devices run verification commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// No verification anywhere.
    None,
    /// Only the canary is verified.
    Canary,
    /// Every device is verified.
    All,
}

impl Default for VerifyMode {
    fn default() -> Self {
        VerifyMode::All
    }
}

crate::simple_display! {
    VerifyMode {
        None => "none",
        Canary => "canary",
        All => "all",
    }
}

/// Operator payload for creating a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    pub canary: DeviceTarget,
    /// Target devices; empty means "all currently imported devices".
    #[serde(default)]
    pub devices: Vec<DeviceTarget>,
    /// Newline-separated configuration command block.
    pub commands: String,
    #[serde(default)]
    pub verify_mode: VerifyMode,
    /// Job-level override for per-device verify commands.
    #[serde(default)]
    pub verify_cmds: Vec<String>,
    #[serde(default = "default_concurrency")]
    pub concurrency_limit: usize,
    #[serde(default)]
    pub stagger_delay_ms: u64,
    #[serde(default = "default_stop_on_error")]
    pub stop_on_error: bool,
}

fn default_concurrency() -> usize {
    5
}

fn default_stop_on_error() -> bool {
    true
}

impl JobSpec {
    pub fn new(canary: DeviceTarget, commands: impl Into<String>) -> Self {
        Self {
            job_name: None,
            creator: None,
            canary,
            devices: Vec::new(),
            commands: commands.into(),
            verify_mode: VerifyMode::default(),
            verify_cmds: Vec::new(),
            concurrency_limit: default_concurrency(),
            stagger_delay_ms: 0,
            stop_on_error: true,
        }
    }

    crate::setters! {
        set {
            devices: Vec<DeviceTarget>,
            verify_mode: VerifyMode,
            verify_cmds: Vec<String>,
            concurrency_limit: usize,
            stagger_delay_ms: u64,
            stop_on_error: bool,
        }
        option {
            job_name: String,
            creator: String,
        }
    }

    /// Reject malformed specs before they reach the registry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.commands.trim().is_empty() {
            return Err(ValidationError::EmptyCommands);
        }
        if self.concurrency_limit == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// Maximum allowed non-canary retry limit.
pub const MAX_RETRY_LIMIT: u32 = 3;

/// Runtime behavior for a single engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub concurrency_limit: usize,
    pub stagger_delay_ms: u64,
    pub stop_on_error: bool,
    pub non_canary_retry_limit: u32,
    pub retry_backoff_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency(),
            stagger_delay_ms: 0,
            stop_on_error: true,
            non_canary_retry_limit: 1,
            retry_backoff_ms: 0,
        }
    }
}

impl RunConfig {
    /// Derive run settings from the job's stored knobs.
    pub fn from_job(job: &JobRecord) -> Self {
        Self {
            concurrency_limit: job.concurrency_limit,
            stagger_delay_ms: job.stagger_delay_ms,
            stop_on_error: job.stop_on_error,
            ..Self::default()
        }
    }

    pub fn stagger_delay(&self) -> Duration {
        Duration::from_millis(self.stagger_delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.concurrency_limit == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        if self.non_canary_retry_limit > MAX_RETRY_LIMIT {
            return Err(ValidationError::RetryLimitTooHigh(
                self.non_canary_retry_limit,
                MAX_RETRY_LIMIT,
            ));
        }
        Ok(())
    }
}

/// Job aggregate.
///
/// Owned and mutated exclusively by the registry; the engine reads it and
/// updates device results through registry operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub canary: DeviceTarget,
    pub commands: String,
    pub verify_mode: VerifyMode,
    #[serde(default)]
    pub verify_cmds: Vec<String>,
    pub concurrency_limit: usize,
    pub stagger_delay_ms: u64,
    pub stop_on_error: bool,
    /// Per-device outcomes, in original target order.
    pub device_results: IndexMap<DeviceKey, DeviceResult>,
    /// Frozen connection snapshots captured at creation. Holds
    /// credentials, so it never leaves the process.
    #[serde(skip)]
    pub device_params: HashMap<DeviceKey, DeviceParams>,
}

impl JobRecord {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Command block split into trimmed, non-empty lines.
    pub fn command_list(&self) -> Vec<String> {
        self.commands
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Effective verify commands for one device under the job's verify mode.
    pub fn verify_cmds_for(&self, params: &DeviceParams, is_canary: bool) -> Vec<String> {
        match self.verify_mode {
            VerifyMode::None => Vec::new(),
            VerifyMode::Canary if !is_canary => Vec::new(),
            _ => params.verify_cmds.clone(),
        }
    }

    /// Seconds from start to completion (or `now` while still running).
    pub fn duration_seconds(&self, now: DateTime<Utc>) -> Option<f64> {
        let started = self.started_at?;
        let end = self.completed_at.unwrap_or(now);
        Some((end - started).num_milliseconds() as f64 / 1000.0)
    }

    /// Exit code a CLI front-end maps this job's terminal status to.
    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            JobStatus::Completed => Some(0),
            JobStatus::Failed => Some(1),
            JobStatus::Cancelled => Some(130),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
