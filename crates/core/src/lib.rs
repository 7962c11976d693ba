// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nr-core: Domain model for the netrun configuration runner

pub mod macros;

pub mod clock;
pub mod control;
pub mod device;
pub mod error;
pub mod event;
pub mod job;
pub mod result;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use control::JobControl;
pub use device::{DeviceKey, DeviceParams, DeviceProfile, DeviceTarget};
pub use error::{InvalidTransition, ValidationError};
pub use event::{EventType, ExecutionEvent};
pub use job::{JobEvent, JobId, JobRecord, JobSpec, JobStatus, RunConfig, VerifyMode};
pub use result::{DeviceExecutionResult, DeviceResult, DeviceStatus, WorkStatus};
