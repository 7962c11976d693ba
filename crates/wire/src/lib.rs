// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod frame;
mod request;
mod response;
mod types;

pub use frame::{decode, encode, read_message, write_message, ProtocolError, MAX_FRAME};
pub use request::{Request, RunOverrides};
pub use response::{ErrorKind, Response};
pub use types::{FailedRowEntry, JobSummary};
