// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only status command execution.
//!
//! Operators can run exec-mode show commands against a managed device
//! outside any job. Anything that could change device state is rejected
//! before a connection is opened.

use crate::ssh::{exec_command, open_session};
use nr_core::DeviceParams;
use thiserror::Error;

/// Command prefixes and phrases that can change device state.
pub const DISRUPTIVE_PATTERNS: [&str; 9] = [
    "configure",
    "conf t",
    "conf term",
    "reload",
    "write erase",
    "erase",
    "delete",
    "format",
    "debug",
];

#[derive(Debug, Error)]
pub enum StatusCommandError {
    #[error("Potentially disruptive commands are not allowed: {0}")]
    Disruptive(String),

    #[error("no commands provided")]
    Empty,

    #[error("{0}")]
    Device(String),
}

/// Reject command blocks containing a disruptive pattern.
pub fn check_disruptive(commands: &str) -> Result<Vec<String>, StatusCommandError> {
    let cmds: Vec<String> = commands
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if cmds.is_empty() {
        return Err(StatusCommandError::Empty);
    }
    for cmd in &cmds {
        let lowered = cmd.to_lowercase();
        if DISRUPTIVE_PATTERNS.iter().any(|p| lowered.contains(p)) {
            return Err(StatusCommandError::Disruptive(cmd.clone()));
        }
    }
    Ok(cmds)
}

/// Execute exec-mode read-only commands and return the combined transcript.
///
/// Output interleaves each command (prefixed `$ `) with what the device
/// returned for it.
pub async fn run_status_command(
    params: DeviceParams,
    commands: String,
) -> Result<String, StatusCommandError> {
    let cmds = check_disruptive(&commands)?;
    tokio::task::spawn_blocking(move || {
        let session = open_session(&params).map_err(|e| StatusCommandError::Device(e.to_string()))?;
        let mut transcript = Vec::new();
        for cmd in &cmds {
            transcript.push(format!("$ {cmd}"));
            let output =
                exec_command(&session, cmd).map_err(|e| StatusCommandError::Device(e.to_string()))?;
            transcript.push(output);
        }
        let _ = session.disconnect(None, "done", None);
        Ok(transcript.join("\n"))
    })
    .await
    .unwrap_or_else(|e| Err(StatusCommandError::Device(format!("execution task failed: {e}"))))
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
