// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    completed = { JobStatus::Completed, 0 },
    failed    = { JobStatus::Failed, 1 },
    cancelled = { JobStatus::Cancelled, 130 },
)]
fn terminal_exit_codes(status: JobStatus, expected: i32) {
    assert_eq!(exit_code(status), expected);
}

#[yare::parameterized(
    none   = { "none", VerifyMode::None },
    canary = { "canary", VerifyMode::Canary },
    all    = { "all", VerifyMode::All },
)]
fn verify_mode_parsing(input: &str, expected: VerifyMode) {
    assert_eq!(parse_verify_mode(input).unwrap(), expected);
}

#[test]
fn unknown_verify_mode_is_rejected() {
    assert!(parse_verify_mode("sometimes").is_err());
}

#[yare::parameterized(
    completed = { "completed", Some(JobStatus::Completed) },
    failed    = { "failed", Some(JobStatus::Failed) },
    cancelled = { "cancelled", Some(JobStatus::Cancelled) },
    running   = { "running", None },
)]
fn terminal_status_parsing(input: &str, expected: Option<JobStatus>) {
    assert_eq!(parse_terminal_status(input), expected);
}

#[test]
fn job_id_parsing() {
    let id = JobId::new();
    assert_eq!(parse_job_id(&id.to_string()).unwrap(), id);
    assert!(parse_job_id("not-a-uuid").is_err());
}
