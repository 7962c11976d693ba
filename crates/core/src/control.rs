// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative pause and cancel signals for a running job.
//!
//! Cancellation is never forced: the engine loop and device workers check
//! the shared flags at their checkpoints. `cancel` latches once set;
//! `pause` is a gate cleared by resume (or by cancel).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Poll interval for cooperative pause waits.
pub const PAUSE_POLL: Duration = Duration::from_millis(200);

/// Per-job control signals, shared via `Arc` between the registry, the
/// engine loop, and in-flight device workers.
#[derive(Debug, Default)]
pub struct JobControl {
    paused: AtomicBool,
    cancelled: AtomicBool,
}

impl JobControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Latch cancellation. Also releases any pause waiters.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Block the calling thread while paused, polling at [`PAUSE_POLL`].
    ///
    /// Returns `false` when cancellation was requested, either during the
    /// wait or before it.
    pub fn block_if_paused(&self) -> bool {
        while self.is_paused() {
            if self.is_cancelled() {
                return false;
            }
            std::thread::sleep(PAUSE_POLL);
        }
        !self.is_cancelled()
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
