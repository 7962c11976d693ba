// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic device worker for tests and simulated deployments.
//!
//! Outcomes are scripted per device key; unscripted devices succeed with a
//! synthetic apply log. The per-device delay mirrors real execution time so
//! pause/cancel races are exercisable.

use crate::{DeviceWorker, WorkRequest};
use async_trait::async_trait;
use nr_core::{DeviceExecutionResult, DeviceKey};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

#[derive(Debug, Default)]
struct SimState {
    script: HashMap<DeviceKey, VecDeque<DeviceExecutionResult>>,
    invocations: Vec<DeviceKey>,
}

/// Scripted worker returning deterministic outcomes per device key.
#[derive(Debug, Default)]
pub struct SimulatedDeviceWorker {
    delay: Duration,
    state: Mutex<SimState>,
}

impl SimulatedDeviceWorker {
    pub fn new(delay: Duration) -> Self {
        Self { delay, state: Mutex::new(SimState::default()) }
    }

    /// Queue outcomes for one device; consumed in order, one per attempt.
    #[cfg(any(test, feature = "test-support"))]
    pub fn script(&self, key: DeviceKey, outcomes: Vec<DeviceExecutionResult>) {
        self.state.lock().script.entry(key).or_default().extend(outcomes);
    }

    /// Device keys in invocation order, across all attempts.
    #[cfg(any(test, feature = "test-support"))]
    pub fn invocations(&self) -> Vec<DeviceKey> {
        self.state.lock().invocations.clone()
    }

    fn next_outcome(&self, key: &DeviceKey, request: &WorkRequest) -> DeviceExecutionResult {
        let mut state = self.state.lock();
        state.invocations.push(key.clone());
        if let Some(queue) = state.script.get_mut(key) {
            if let Some(outcome) = queue.pop_front() {
                return outcome;
            }
        }
        let mut outcome = DeviceExecutionResult::success();
        outcome.logs = vec![format!(
            "simulated apply on {}: {} commands",
            key,
            request.commands.len()
        )];
        outcome
    }
}

#[async_trait]
impl DeviceWorker for SimulatedDeviceWorker {
    async fn run(&self, request: WorkRequest) -> DeviceExecutionResult {
        let key = request.device.key();
        if request.control.is_cancelled() {
            return DeviceExecutionResult::cancelled("Job was cancelled by user request");
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        // Checkpoint after the simulated work, mirroring the real worker's
        // apply/post-verify boundary.
        if request.control.is_cancelled() {
            return DeviceExecutionResult::cancelled("Job was cancelled by user request");
        }
        self.next_outcome(&key, &request)
    }
}

#[cfg(test)]
#[path = "sim_tests.rs"]
mod tests;
