// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device targets, imported profiles, and frozen connection snapshots.

use serde::{Deserialize, Serialize};

/// Stable `"host:port"` identifier used for maps, events, and logs.
///
/// Derived deterministically from a [`DeviceTarget`]; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceKey(String);

impl DeviceKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// SSH connection target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceTarget {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    22
}

impl DeviceTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// Stable key for maps and logs.
    pub fn key(&self) -> DeviceKey {
        DeviceKey(format!("{}:{}", self.host, self.port))
    }

    /// Parse `"host:port"`; a bare host defaults to port 22.
    pub fn parse(s: &str) -> Result<Self, crate::error::ValidationError> {
        match s.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                let port = port.parse::<u16>().map_err(|_| {
                    crate::error::ValidationError::InvalidTarget(s.to_string())
                })?;
                Ok(Self::new(host, port))
            }
            None if !s.is_empty() => Ok(Self::new(s, 22)),
            _ => Err(crate::error::ValidationError::InvalidTarget(s.to_string())),
        }
    }
}

impl std::fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Imported device profile with its connection-validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub host: String,
    pub port: u16,
    pub device_type: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub verify_cmds: Vec<String>,
    #[serde(default)]
    pub connection_ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DeviceProfile {
    pub fn key(&self) -> DeviceKey {
        self.target().key()
    }

    pub fn target(&self) -> DeviceTarget {
        DeviceTarget::new(self.host.clone(), self.port)
    }
}

/// Frozen snapshot of a device's connection parameters at job creation.
///
/// Once a job is created its params never change, even if the live
/// inventory is replaced by a re-import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceParams {
    pub host: String,
    pub port: u16,
    pub device_type: String,
    pub username: String,
    pub password: String,
    /// Effective verification commands for this device (job override
    /// applied at snapshot time).
    #[serde(default)]
    pub verify_cmds: Vec<String>,
}

impl DeviceParams {
    /// Snapshot a profile, substituting the job-level verify override when
    /// it is non-empty.
    pub fn snapshot(profile: &DeviceProfile, verify_override: &[String]) -> Self {
        let verify_cmds = if verify_override.is_empty() {
            profile.verify_cmds.clone()
        } else {
            verify_override.to_vec()
        };
        Self {
            host: profile.host.clone(),
            port: profile.port,
            device_type: profile.device_type.clone(),
            username: profile.username.clone(),
            password: profile.password.clone(),
            verify_cmds,
        }
    }

    pub fn target(&self) -> DeviceTarget {
        DeviceTarget::new(self.host.clone(), self.port)
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
