// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared daemon context handed to every request handler.

use crate::env::{ValidatorMode, WorkerMode};
use nr_core::SystemClock;
use nr_engine::{EventBus, ExecutionEngine, JobRegistry, RunCoordinator};
use nr_inventory::DeviceStore;
use nr_worker::{
    ConnectionValidator, DeviceWorker, SimulatedConnectionValidator, SimulatedDeviceWorker,
    SshConnectionValidator, SshDeviceWorker,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// The daemon's injected object graph.
pub struct DaemonCtx {
    pub store: Arc<DeviceStore>,
    pub registry: Arc<JobRegistry<SystemClock>>,
    pub bus: Arc<EventBus>,
    pub engine: Arc<ExecutionEngine<SystemClock>>,
    pub coordinator: Arc<RunCoordinator>,
    pub validator: Arc<dyn ConnectionValidator>,
    pub clock: SystemClock,
    pub shutdown: Arc<Notify>,
}

impl DaemonCtx {
    /// Wire up the graph for the given modes.
    pub fn build(
        worker_mode: WorkerMode,
        validator_mode: ValidatorMode,
        simulated_delay: Duration,
        history_limit: usize,
    ) -> Self {
        let clock = SystemClock;
        let store = Arc::new(DeviceStore::new());
        let registry = Arc::new(JobRegistry::new(clock.clone(), history_limit));
        let bus = Arc::new(EventBus::new());

        let worker: Arc<dyn DeviceWorker> = match worker_mode {
            WorkerMode::Real => Arc::new(SshDeviceWorker::new()),
            WorkerMode::Simulated => Arc::new(SimulatedDeviceWorker::new(simulated_delay)),
        };
        let validator: Arc<dyn ConnectionValidator> = match validator_mode {
            ValidatorMode::Real => Arc::new(SshConnectionValidator::new()),
            ValidatorMode::Simulated => Arc::new(SimulatedConnectionValidator::new()),
        };

        let engine = Arc::new(ExecutionEngine::new(
            Arc::clone(&registry),
            Arc::clone(&bus),
            worker,
            clock.clone(),
        ));

        Self {
            store,
            registry,
            bus,
            engine,
            coordinator: Arc::new(RunCoordinator::new()),
            validator,
            clock,
            shutdown: Arc::new(Notify::new()),
        }
    }
}
