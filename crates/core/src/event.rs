// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution events streamed to live observers.
//!
//! For each job the event sequence is totally ordered by append order and
//! a single `job_complete` event terminates the stream.

use crate::device::DeviceKey;
use crate::job::{JobId, JobStatus};
use crate::result::DeviceStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind tag for [`ExecutionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    JobStatus,
    DeviceStatus,
    Log,
    JobComplete,
}

crate::simple_display! {
    EventType {
        JobStatus => "job_status",
        DeviceStatus => "device_status",
        Log => "log",
        JobComplete => "job_complete",
    }
}

/// Single event emitted by the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub job_id: JobId,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExecutionEvent {
    pub fn job_status(job_id: JobId, status: JobStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: EventType::JobStatus,
            job_id,
            timestamp,
            device: None,
            status: Some(status.to_string()),
            message: None,
        }
    }

    pub fn device_status(
        job_id: JobId,
        device: DeviceKey,
        status: DeviceStatus,
        message: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type: EventType::DeviceStatus,
            job_id,
            timestamp,
            device: Some(device),
            status: Some(status.to_string()),
            message,
        }
    }

    pub fn log(
        job_id: JobId,
        device: DeviceKey,
        line: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type: EventType::Log,
            job_id,
            timestamp,
            device: Some(device),
            status: None,
            message: Some(line.into()),
        }
    }

    pub fn job_complete(job_id: JobId, status: JobStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: EventType::JobComplete,
            job_id,
            timestamp,
            device: None,
            status: Some(status.to_string()),
            message: None,
        }
    }

    /// True for the event that terminates a job's stream.
    pub fn is_final(&self) -> bool {
        self.event_type == EventType::JobComplete
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
