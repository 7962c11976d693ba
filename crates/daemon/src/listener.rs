// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! Accepts connections and spawns a task per connection; handlers run
//! against the shared context and never block the accept loop. `Watch`
//! streams event frames on the same connection until `job_complete`.

use crate::ctx::DaemonCtx;
use crate::handlers;
use nr_core::JobId;
use nr_wire::{read_message, write_message, ProtocolError, Request, Response};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::net::UnixListener;
use tracing::{debug, error, info};

/// Accept loop. Runs until the shutdown notification fires.
pub async fn serve(listener: UnixListener, ctx: Arc<DaemonCtx>) {
    let shutdown = Arc::clone(&ctx.shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("accept error: {e}"),
            },
            _ = shutdown.notified() => {
                info!("listener shutting down");
                return;
            }
        }
    }
}

fn log_connection_error(e: ProtocolError) {
    match e {
        ProtocolError::ConnectionClosed => debug!("connection closed"),
        other => error!("connection error: {other}"),
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    ctx: Arc<DaemonCtx>,
) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    loop {
        let request = match read_message::<_, Request>(&mut reader).await {
            Ok(request) => request,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };
        debug!(?request, "request");

        match request {
            Request::Shutdown => {
                write_message(&mut writer, &Response::ShuttingDown).await?;
                ctx.shutdown.notify_waiters();
                return Ok(());
            }
            Request::Watch { job_id, start_index } => {
                watch(&ctx, job_id, start_index, &mut writer).await?;
                return Ok(());
            }
            other => {
                let response = handlers::dispatch(&ctx, other).await;
                write_message(&mut writer, &response).await?;
            }
        }
    }
}

/// Stream a job's events as `Event` frames until the final one.
///
/// Backfill from `start_index` first, then live events. The stream (and
/// the connection) ends after `job_complete`.
async fn watch<W: AsyncWrite + Unpin>(
    ctx: &Arc<DaemonCtx>,
    job_id: JobId,
    start_index: usize,
    writer: &mut W,
) -> Result<(), ProtocolError> {
    if let Err(e) = ctx.registry.get(job_id) {
        write_message(writer, &handlers::engine_error(e)).await?;
        return Ok(());
    }

    let (backfill, mut rx) = ctx.bus.subscribe(job_id, start_index);
    for event in backfill {
        let is_final = event.is_final();
        write_message(writer, &Response::Event { event }).await?;
        if is_final {
            return Ok(());
        }
    }
    while let Some(event) = rx.recv().await {
        let is_final = event.is_final();
        write_message(writer, &Response::Event { event }).await?;
        if is_final {
            return Ok(());
        }
    }
    Ok(())
}
