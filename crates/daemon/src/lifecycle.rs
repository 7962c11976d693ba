// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: state directory, lock file, socket binding.

use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::info;

/// Filesystem layout for one daemon instance.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;
        let socket_path = crate::env::socket_path(&state_dir);
        let lock_path = state_dir.join("netrund.lock");
        Ok(Self { state_dir, socket_path, lock_path })
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("another daemon holds the lock: {0}")]
    LockFailed(std::io::Error),

    #[error("cannot resolve a state directory (HOME unset)")]
    NoStateDir,
}

/// Acquired startup resources. The lock file must stay alive for the
/// daemon's lifetime; dropping it releases the lock.
#[derive(Debug)]
pub struct Startup {
    pub listener: UnixListener,
    pub lock_file: File,
}

/// Create the state directory, take the exclusive lock, and bind the socket.
pub fn startup(config: &Config) -> Result<Startup, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Lock first: prevents a second daemon from clobbering the socket.
    // OpenOptions avoids truncating the running daemon's PID before the
    // lock is actually held.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // A leftover socket file from an unclean exit would fail the bind.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)?;
    info!(socket = %config.socket_path.display(), "daemon listening");

    Ok(Startup { listener, lock_file })
}

/// Remove the socket file on exit. Best-effort.
pub fn cleanup(config: &Config) {
    let _ = std::fs::remove_file(&config.socket_path);
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
