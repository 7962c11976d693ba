// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CSV device import.
//!
//! Header-based CSV with required `host, device_type, username, password`
//! and optional `port`, `name`, `verify_cmds` (semicolon-separated). Rows
//! that fail to parse are reported with their 1-based row number (the
//! header is row 1) rather than aborting the import.

use crate::store::DeviceStore;
use nr_core::DeviceProfile;
use nr_worker::ConnectionValidator;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no valid devices found in CSV")]
    NoDevices,
}

/// One rejected CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRow {
    pub row_number: usize,
    pub error: String,
}

/// Outcome of an import: validated devices plus per-row failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceImportResult {
    pub devices: Vec<DeviceProfile>,
    pub failed_rows: Vec<FailedRow>,
}

const REQUIRED_FIELDS: [&str; 4] = ["host", "device_type", "username", "password"];

fn field(record: &csv::StringRecord, headers: &csv::StringRecord, name: &str) -> String {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .and_then(|i| record.get(i))
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

fn parse_row(
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
) -> Result<DeviceProfile, String> {
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .filter(|name| field(record, headers, name).is_empty())
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(format!("Missing required fields: {}", missing.join(", ")));
    }

    let port_raw = field(record, headers, "port");
    let port = if port_raw.is_empty() {
        22
    } else {
        port_raw
            .parse::<u16>()
            .map_err(|_| format!("Invalid port value: {port_raw}"))?
    };

    let name = field(record, headers, "name");
    let verify_cmds: Vec<String> = field(record, headers, "verify_cmds")
        .split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    Ok(DeviceProfile {
        host: field(record, headers, "host"),
        port,
        device_type: field(record, headers, "device_type"),
        username: field(record, headers, "username"),
        password: field(record, headers, "password"),
        name: (!name.is_empty()).then_some(name),
        verify_cmds,
        connection_ok: false,
        error_message: None,
    })
}

/// Parse CSV content, validate each device's connection, and replace the
/// store with the devices that passed.
///
/// The returned result carries every parsed device (with its validation
/// outcome) so the operator sees which hosts were rejected and why.
pub fn import_csv(
    csv_content: &str,
    store: &DeviceStore,
    validator: &dyn ConnectionValidator,
) -> Result<DeviceImportResult, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_content.as_bytes());
    let headers = reader.headers()?.clone();

    let mut parsed = Vec::new();
    let mut failed_rows = Vec::new();
    // Header is row 1; the first data row is 2.
    for (offset, record) in reader.records().enumerate() {
        let row_number = offset + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                failed_rows.push(FailedRow { row_number, error: e.to_string() });
                continue;
            }
        };
        match parse_row(&record, &headers) {
            Ok(profile) => parsed.push(profile),
            Err(error) => failed_rows.push(FailedRow { row_number, error }),
        }
    }

    if parsed.is_empty() {
        return Err(ImportError::NoDevices);
    }

    let mut validated = Vec::with_capacity(parsed.len());
    for mut profile in parsed {
        let (ok, error_message) = validator.validate(&profile);
        profile.connection_ok = ok;
        profile.error_message = error_message;
        validated.push(profile);
    }

    let accepted: Vec<DeviceProfile> =
        validated.iter().filter(|d| d.connection_ok).cloned().collect();
    info!(
        parsed = validated.len(),
        accepted = accepted.len(),
        failed_rows = failed_rows.len(),
        "device import"
    );
    store.replace(accepted);

    Ok(DeviceImportResult { devices: validated, failed_rows })
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
