// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core error types.

use crate::job::{JobEvent, JobStatus};
use thiserror::Error;

/// Rejected job lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: status={status}, event={event}")]
pub struct InvalidTransition {
    pub status: JobStatus,
    pub event: JobEvent,
}

/// Malformed operator input, rejected before it reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("commands cannot be empty")]
    EmptyCommands,

    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,

    #[error("retry limit {0} exceeds maximum of {1}")]
    RetryLimitTooHigh(u32, u32),

    #[error("invalid device target: {0:?}")]
    InvalidTarget(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message() {
        let err = InvalidTransition { status: JobStatus::Completed, event: JobEvent::Start };
        assert_eq!(err.to_string(), "invalid transition: status=completed, event=start");
    }
}
