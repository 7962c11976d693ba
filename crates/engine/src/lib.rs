// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nr-engine: canary-first execution engine and its supporting services.
//!
//! The engine orchestrates one job from RUNNING to a terminal status:
//! canary first, then bounded parallel fan-out with staggered admission,
//! cooperative pause/cancel, per-device retry, and ordered event
//! publication. The registry owns job mutation, the bus owns event
//! sequences, and the coordinator bounds background runs to one per job.
//! All dependencies are injected at construction; there is no ambient
//! process-wide state.

pub mod bus;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod registry;

pub use bus::EventBus;
pub use coordinator::RunCoordinator;
pub use engine::ExecutionEngine;
pub use error::EngineError;
pub use registry::JobRegistry;

/// Default number of terminal jobs retained in history.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
