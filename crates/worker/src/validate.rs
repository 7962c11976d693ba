// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection validators used by the device importer.

use crate::ssh::open_session;
use nr_core::{DeviceParams, DeviceProfile};

/// Lightweight pre-validation of a device's connection parameters.
///
/// Synchronous by design: the importer walks devices one at a time and
/// callers run the whole import on the blocking pool.
pub trait ConnectionValidator: Send + Sync {
    /// Returns `(connection_ok, error_message)`.
    fn validate(&self, profile: &DeviceProfile) -> (bool, Option<String>);
}

/// Real validator: connects and authenticates, then disconnects.
#[derive(Debug, Clone, Default)]
pub struct SshConnectionValidator;

impl SshConnectionValidator {
    pub fn new() -> Self {
        Self
    }
}

impl ConnectionValidator for SshConnectionValidator {
    fn validate(&self, profile: &DeviceProfile) -> (bool, Option<String>) {
        let params = DeviceParams::snapshot(profile, &[]);
        match open_session(&params) {
            Ok(session) => {
                let _ = session.disconnect(None, "validation", None);
                (true, None)
            }
            Err(e) => (false, Some(e.to_string())),
        }
    }
}

/// Validator that accepts every device; used in simulated deployments.
#[derive(Debug, Clone, Default)]
pub struct SimulatedConnectionValidator;

impl SimulatedConnectionValidator {
    pub fn new() -> Self {
        Self
    }
}

impl ConnectionValidator for SimulatedConnectionValidator {
    fn validate(&self, _profile: &DeviceProfile) -> (bool, Option<String>) {
        (true, None)
    }
}
