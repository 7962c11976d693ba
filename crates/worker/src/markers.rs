// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device error markers scanned in apply output.
//!
//! Network operating systems echo rejection text instead of failing the
//! session, so a successful command exchange can still mean a rejected
//! configuration line.

/// Patterns that mark a rejected or malformed command in device output.
pub const ERROR_PATTERNS: [&str; 5] = [
    "% Invalid input",
    "Invalid input detected",
    "Error:",
    "Ambiguous command",
    "Incomplete command",
];

/// Scan output for a known error marker.
///
/// Returns the full error message for the first marker found.
pub fn check_for_errors(output: &str) -> Option<String> {
    ERROR_PATTERNS
        .iter()
        .find(|pattern| output.contains(*pattern))
        .map(|pattern| format!("Command error detected: {pattern}"))
}

#[cfg(test)]
#[path = "markers_tests.rs"]
mod tests;
