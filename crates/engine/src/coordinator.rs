// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background run coordination: at most one live runner per job.

use nr_core::JobId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use tokio::task::JoinHandle;

/// Launches at most one background run per job, reaping finished runners
/// lazily on each call.
#[derive(Default)]
pub struct RunCoordinator {
    runners: Mutex<HashMap<JobId, JoinHandle<()>>>,
}

impl RunCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn reap_finished(runners: &mut HashMap<JobId, JoinHandle<()>>) {
        runners.retain(|_, handle| !handle.is_finished());
    }

    /// True while a runner for the job is still live.
    pub fn is_running(&self, job_id: JobId) -> bool {
        let mut runners = self.runners.lock();
        Self::reap_finished(&mut runners);
        runners.contains_key(&job_id)
    }

    /// Spawn a background run unless one is already live for this job.
    ///
    /// Returns `false` without spawning when a live runner exists.
    pub fn start<F>(&self, job_id: JobId, run: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut runners = self.runners.lock();
        Self::reap_finished(&mut runners);
        if runners.contains_key(&job_id) {
            return false;
        }
        runners.insert(job_id, tokio::spawn(run));
        true
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
