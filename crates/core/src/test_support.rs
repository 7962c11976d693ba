// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::device::{DeviceProfile, DeviceTarget};
use crate::job::JobSpec;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::job::{JobEvent, JobStatus};
    use proptest::prelude::*;

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Queued),
            Just(JobStatus::Running),
            Just(JobStatus::Paused),
            Just(JobStatus::Completed),
            Just(JobStatus::Failed),
            Just(JobStatus::Cancelled),
        ]
    }

    pub fn arb_job_event() -> impl Strategy<Value = JobEvent> {
        prop_oneof![
            Just(JobEvent::Start),
            Just(JobEvent::Pause),
            Just(JobEvent::Resume),
            Just(JobEvent::Complete),
            Just(JobEvent::Fail),
            Just(JobEvent::Cancel),
        ]
    }
}

// ── Factory functions ───────────────────────────────────────────────────

/// Target on port 22.
pub fn target(host: &str) -> DeviceTarget {
    DeviceTarget::new(host, 22)
}

/// Validated profile with a default verify command.
pub fn profile(host: &str) -> DeviceProfile {
    DeviceProfile {
        host: host.to_string(),
        port: 22,
        device_type: "cisco_ios".to_string(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        name: None,
        verify_cmds: vec!["show running-config".to_string()],
        connection_ok: true,
        error_message: None,
    }
}

/// Minimal valid spec targeting the given hosts, first host as canary.
pub fn spec(hosts: &[&str]) -> JobSpec {
    let devices: Vec<DeviceTarget> = hosts.iter().map(|h| target(h)).collect();
    let canary = devices.first().cloned().unwrap_or_else(|| target("10.0.0.1"));
    JobSpec::new(canary, "interface Gi0/1\n no shutdown").devices(devices)
}
