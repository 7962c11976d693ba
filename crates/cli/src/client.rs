// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket client for the daemon's wire protocol.

use anyhow::{bail, Context, Result};
use nr_core::ExecutionEvent;
use nr_wire::{read_message, write_message, ProtocolError, Request, Response};
use std::path::PathBuf;
use tokio::net::UnixStream;

pub struct Client {
    stream: UnixStream,
}

pub fn socket_path() -> Result<PathBuf> {
    let state_dir = nr_daemon::env::state_dir().context("resolving state directory")?;
    Ok(nr_daemon::env::socket_path(&state_dir))
}

impl Client {
    pub async fn connect() -> Result<Self> {
        let path = socket_path()?;
        let stream = UnixStream::connect(&path)
            .await
            .with_context(|| format!("daemon not reachable at {} (is netrund running?)", path.display()))?;
        Ok(Self { stream })
    }

    /// Send one request without reading a response (streaming requests).
    pub async fn send(&mut self, request: &Request) -> Result<()> {
        write_message(&mut self.stream, request).await?;
        Ok(())
    }

    /// Send one request and read one response.
    pub async fn request(&mut self, request: &Request) -> Result<Response> {
        self.send(request).await?;
        let response = read_message::<_, Response>(&mut self.stream).await?;
        Ok(response)
    }

    /// Send one request, failing on a protocol-level error response.
    pub async fn expect_ok(&mut self, request: &Request) -> Result<Response> {
        match self.request(request).await? {
            Response::Error { kind, message } => bail!("{kind}: {message}"),
            response => Ok(response),
        }
    }

    /// Read the next streamed event frame; `None` when the stream ended.
    pub async fn next_event(&mut self) -> Result<Option<ExecutionEvent>> {
        match read_message::<_, Response>(&mut self.stream).await {
            Ok(Response::Event { event }) => Ok(Some(event)),
            Ok(Response::Error { kind, message }) => bail!("{kind}: {message}"),
            Ok(other) => bail!("unexpected frame in event stream: {other:?}"),
            Err(ProtocolError::ConnectionClosed) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
