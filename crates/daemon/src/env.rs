// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.
//!
//! All toggles are read once at startup; nothing re-reads the environment
//! while the daemon is serving.

use crate::lifecycle::LifecycleError;
use std::path::PathBuf;
use std::time::Duration;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Which device worker the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMode {
    Real,
    Simulated,
}

/// Which connection validator the importer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorMode {
    Real,
    Simulated,
}

/// Resolve state directory: NETRUN_STATE_DIR > XDG_STATE_HOME/netrun > ~/.local/state/netrun
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("NETRUN_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("netrun"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/netrun"))
}

/// Socket path override (`NETRUN_SOCKET`), defaulting under the state dir.
pub fn socket_path(state_dir: &std::path::Path) -> PathBuf {
    std::env::var("NETRUN_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir.join("netrund.sock"))
}

/// Worker mode (`NETRUN_WORKER_MODE`): `real` | `simulated` (default).
pub fn worker_mode() -> WorkerMode {
    match std::env::var("NETRUN_WORKER_MODE").unwrap_or_default().trim().to_lowercase().as_str() {
        "real" => WorkerMode::Real,
        _ => WorkerMode::Simulated,
    }
}

/// Validator mode (`NETRUN_VALIDATOR_MODE`): `real` | `simulated` (default).
pub fn validator_mode() -> ValidatorMode {
    match std::env::var("NETRUN_VALIDATOR_MODE").unwrap_or_default().trim().to_lowercase().as_str()
    {
        "real" => ValidatorMode::Real,
        _ => ValidatorMode::Simulated,
    }
}

/// Per-device delay for the simulated worker (`NETRUN_SIMULATED_DELAY_MS`).
pub fn simulated_delay() -> Duration {
    std::env::var("NETRUN_SIMULATED_DELAY_MS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::ZERO)
}

/// Terminal jobs retained in history (`NETRUN_HISTORY_LIMIT`).
pub fn history_limit() -> usize {
    std::env::var("NETRUN_HISTORY_LIMIT")
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(nr_engine::DEFAULT_HISTORY_LIMIT)
}

/// Default IPC timeout (`NETRUN_IPC_TIMEOUT_MS`).
pub fn ipc_timeout() -> Duration {
    std::env::var("NETRUN_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
