// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ssh2-backed device worker.
//!
//! The ssh2 API is synchronous, so the whole execution runs on the tokio
//! blocking pool. Expected failures (connect, auth, command I/O, device
//! error markers) are translated into tagged results at this boundary and
//! never escape as errors.

use crate::diff::maybe_diff;
use crate::logbuf::LogBuffer;
use crate::markers::check_for_errors;
use crate::{DeviceWorker, WorkRequest, COMMAND_TIMEOUT, CONNECT_RETRY_BACKOFF, CONNECT_TIMEOUT};
use async_trait::async_trait;
use nr_core::{DeviceExecutionResult, DeviceParams, WorkStatus};
use ssh2::Session;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use thiserror::Error;

/// SSH-layer failure, translated into a failed result at the worker boundary.
#[derive(Debug, Error)]
pub enum SshError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Command failed: {0}")]
    Command(String),
}

/// Real device worker driving one SSH session per execution.
#[derive(Debug, Clone, Default)]
pub struct SshDeviceWorker;

impl SshDeviceWorker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceWorker for SshDeviceWorker {
    async fn run(&self, request: WorkRequest) -> DeviceExecutionResult {
        tokio::task::spawn_blocking(move || execute(&request))
            .await
            .unwrap_or_else(|e| DeviceExecutionResult::failed(format!("Execution error: {e}")))
    }
}

/// Open an authenticated session against one device.
pub(crate) fn open_session(params: &DeviceParams) -> Result<Session, SshError> {
    let mut addrs = (params.host.as_str(), params.port)
        .to_socket_addrs()
        .map_err(|e| SshError::Connect(e.to_string()))?;
    let addr = addrs
        .next()
        .ok_or_else(|| SshError::Connect(format!("no address for {}", params.host)))?;

    let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        .map_err(|e| SshError::Connect(e.to_string()))?;
    let mut session = Session::new().map_err(|e| SshError::Connect(e.to_string()))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(COMMAND_TIMEOUT.as_millis() as u32);
    session.handshake().map_err(|e| SshError::Connect(e.to_string()))?;
    session
        .userauth_password(&params.username, &params.password)
        .map_err(|e| SshError::Auth(e.to_string()))?;
    if !session.authenticated() {
        return Err(SshError::Auth("authentication rejected".to_string()));
    }
    Ok(session)
}

/// Run one exec-mode command and collect its output.
pub(crate) fn exec_command(session: &Session, command: &str) -> Result<String, SshError> {
    let mut channel = session
        .channel_session()
        .map_err(|e| SshError::Command(e.to_string()))?;
    channel.exec(command).map_err(|e| SshError::Command(e.to_string()))?;

    let mut output = String::new();
    channel
        .read_to_string(&mut output)
        .map_err(|e| SshError::Command(e.to_string()))?;
    let _ = channel.wait_close();
    Ok(output)
}

fn disconnect(session: &Session, logs: &mut LogBuffer) {
    let _ = session.disconnect(None, "done", None);
    logs.push("Disconnected");
}

/// Worker output fields captured so far; folded into the final result.
#[derive(Default)]
struct Captured {
    pre_output: Option<String>,
    apply_output: Option<String>,
    post_output: Option<String>,
    diff: Option<String>,
}

fn finish(
    status: WorkStatus,
    error: Option<String>,
    captured: Captured,
    logs: LogBuffer,
) -> DeviceExecutionResult {
    let (logs, log_trimmed) = logs.finish();
    DeviceExecutionResult {
        status,
        error,
        pre_output: captured.pre_output,
        apply_output: captured.apply_output,
        post_output: captured.post_output,
        diff: captured.diff,
        logs,
        log_trimmed,
        attempts: 1,
    }
}

fn cancelled(mut logs: LogBuffer, captured: Captured) -> DeviceExecutionResult {
    logs.push("Execution cancelled by user request");
    finish(
        WorkStatus::Cancelled,
        Some("Job was cancelled by user request".to_string()),
        captured,
        logs,
    )
}

fn failed(error: String, captured: Captured, mut logs: LogBuffer) -> DeviceExecutionResult {
    logs.push(format!("ERROR: {error}"));
    finish(WorkStatus::Failed, Some(error), captured, logs)
}

/// Connect, retrying once after a fixed backoff when the request allows it.
fn connect_with_retry(
    request: &WorkRequest,
    logs: &mut LogBuffer,
) -> Result<Session, Option<String>> {
    let retries = request.connect_retries();
    let mut attempt = 0;
    loop {
        if request.control.is_cancelled() {
            return Err(None);
        }
        logs.push(format!(
            "Connecting to {}:{}...",
            request.params.host, request.params.port
        ));
        match open_session(&request.params) {
            Ok(session) => {
                logs.push("Connected successfully");
                return Ok(session);
            }
            Err(e) if attempt < retries => {
                logs.push(format!("{e}. Retrying in {}s...", CONNECT_RETRY_BACKOFF.as_secs()));
                std::thread::sleep(CONNECT_RETRY_BACKOFF);
                attempt += 1;
            }
            Err(e) => {
                return Err(Some(e.to_string()));
            }
        }
    }
}

/// Run one batch of verify commands, checking cancel before each.
fn run_verify_batch(
    session: &Session,
    cmds: &[String],
    request: &WorkRequest,
    logs: &mut LogBuffer,
) -> Result<String, VerifyInterrupt> {
    let mut outputs = Vec::new();
    for cmd in cmds {
        if request.control.is_cancelled() {
            return Err(VerifyInterrupt::Cancelled);
        }
        logs.push(format!("  > {cmd}"));
        let output = exec_command(session, cmd).map_err(|e| VerifyInterrupt::Failed(e.to_string()))?;
        outputs.push(output);
    }
    Ok(outputs.join("\n"))
}

enum VerifyInterrupt {
    Cancelled,
    Failed(String),
}

fn execute(request: &WorkRequest) -> DeviceExecutionResult {
    let mut logs = LogBuffer::new();
    let mut captured = Captured::default();

    // Honor a pause that lands between admission and connect; a cancel
    // during (or before) the wait ends the execution.
    if !request.control.block_if_paused() {
        return cancelled(logs, captured);
    }

    let session = match connect_with_retry(request, &mut logs) {
        Ok(session) => session,
        Err(Some(error)) => return failed(error, captured, logs),
        Err(None) => return cancelled(logs, captured),
    };

    // Pre-verification
    if !request.verify_cmds.is_empty() {
        logs.push("Running pre-verification commands...");
        match run_verify_batch(&session, &request.verify_cmds, request, &mut logs) {
            Ok(output) => {
                captured.pre_output = Some(output);
                logs.push("Pre-verification complete");
            }
            Err(VerifyInterrupt::Cancelled) => {
                disconnect(&session, &mut logs);
                return cancelled(logs, captured);
            }
            Err(VerifyInterrupt::Failed(error)) => {
                disconnect(&session, &mut logs);
                return failed(error, captured, logs);
            }
        }
    }

    // Apply phase
    logs.push("Applying configuration commands...");
    let mut apply_parts = Vec::new();
    for cmd in &request.commands {
        logs.push(format!("  > {cmd}"));
        match exec_command(&session, cmd) {
            Ok(output) => apply_parts.push(output),
            Err(e) => {
                disconnect(&session, &mut logs);
                return failed(e.to_string(), captured, logs);
            }
        }
    }
    let apply_output = apply_parts.join("\n");
    captured.apply_output = Some(apply_output.clone());
    logs.push("Configuration applied");

    if let Some(error) = check_for_errors(&apply_output) {
        disconnect(&session, &mut logs);
        return failed(error, captured, logs);
    }

    // Cancel checkpoint between apply and post-verify
    if request.control.is_cancelled() {
        disconnect(&session, &mut logs);
        return cancelled(logs, captured);
    }

    // Post-verification and diff
    if !request.verify_cmds.is_empty() {
        logs.push("Running post-verification commands...");
        match run_verify_batch(&session, &request.verify_cmds, request, &mut logs) {
            Ok(output) => {
                captured.post_output = Some(output);
                logs.push("Post-verification complete");
            }
            Err(VerifyInterrupt::Cancelled) => {
                disconnect(&session, &mut logs);
                return cancelled(logs, captured);
            }
            Err(VerifyInterrupt::Failed(error)) => {
                disconnect(&session, &mut logs);
                return failed(error, captured, logs);
            }
        }
        captured.diff = maybe_diff(captured.pre_output.as_deref(), captured.post_output.as_deref());
        if captured.diff.is_some() {
            logs.push("Diff created");
        }
    }

    disconnect(&session, &mut logs);
    finish(WorkStatus::Success, None, captured, logs)
}
