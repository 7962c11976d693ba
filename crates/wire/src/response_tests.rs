// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    invalid   = { ErrorKind::Invalid, "invalid" },
    conflict  = { ErrorKind::Conflict, "conflict" },
    not_found = { ErrorKind::NotFound, "not_found" },
    internal  = { ErrorKind::Internal, "internal" },
)]
fn error_kind_serializes_snake_case(kind: ErrorKind, expected: &str) {
    let json = serde_json::to_value(kind).unwrap();
    assert_eq!(json, expected);
    assert_eq!(kind.to_string(), expected);
}

#[test]
fn error_response_shape() {
    let response = Response::error(ErrorKind::Conflict, "job abc is already active");
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["type"], "error");
    assert_eq!(json["kind"], "conflict");
    assert_eq!(json["message"], "job abc is already active");
}

#[test]
fn responses_roundtrip() {
    let response = Response::JobCreated { job_id: JobId::new(), status: JobStatus::Queued };
    let json = serde_json::to_string(&response).unwrap();
    let parsed: Response = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, response);
}
