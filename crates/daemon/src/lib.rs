// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! netrund daemon library.
//!
//! The daemon owns the long-lived object graph — device store, job
//! registry, event bus, engine, run coordinator — and serves the wire
//! protocol over a unix socket. Everything is constructed at startup and
//! injected; nothing is process-global.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod ctx;
pub mod env;
pub mod handlers;
pub mod lifecycle;
pub mod listener;

pub use ctx::DaemonCtx;
pub use lifecycle::{Config, LifecycleError};
