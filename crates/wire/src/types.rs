// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol DTOs derived from domain records.

use chrono::{DateTime, Utc};
use nr_core::{JobId, JobRecord, JobStatus};
use serde::{Deserialize, Serialize};

/// One rejected CSV row, as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRowEntry {
    pub row_number: usize,
    pub error: String,
}

/// History entry for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// Exit code a CLI maps the terminal status to (0/1/130).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub device_count: usize,
}

impl JobSummary {
    pub fn from_record(job: &JobRecord, now: DateTime<Utc>) -> Self {
        Self {
            job_id: job.job_id,
            job_name: job.job_name.clone(),
            creator: job.creator.clone(),
            status: job.status,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            duration_seconds: job.duration_seconds(now),
            exit_code: job.exit_code(),
            device_count: job.device_results.len(),
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
