// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle commands.

use crate::client::Client;
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use nr_wire::{Request, Response};
use std::time::Duration;

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start netrund in the background
    Start,
    /// Ask the running daemon to exit
    Stop,
    /// Check whether the daemon is reachable
    Status,
}

pub async fn run(command: DaemonCommand) -> Result<i32> {
    match command {
        DaemonCommand::Start => start().await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Status => status().await,
    }
}

async fn start() -> Result<i32> {
    if Client::connect().await.is_ok() {
        println!("daemon already running");
        return Ok(0);
    }

    let exe = std::env::current_exe().context("locating netrun binary")?;
    let daemon = exe.with_file_name("netrund");
    std::process::Command::new(&daemon)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .with_context(|| format!("spawning {}", daemon.display()))?;

    // Wait for the socket to come up.
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(mut client) = Client::connect().await {
            if matches!(client.request(&Request::Ping).await, Ok(Response::Pong)) {
                println!("daemon started");
                return Ok(0);
            }
        }
    }
    bail!("daemon did not come up within 5s");
}

async fn stop() -> Result<i32> {
    let mut client = Client::connect().await?;
    match client.request(&Request::Shutdown).await? {
        Response::ShuttingDown => {
            println!("daemon stopping");
            Ok(0)
        }
        other => bail!("unexpected response: {other:?}"),
    }
}

async fn status() -> Result<i32> {
    match Client::connect().await {
        Ok(mut client) => match client.request(&Request::Ping).await {
            Ok(Response::Pong) => {
                println!("daemon running at {}", crate::client::socket_path()?.display());
                Ok(0)
            }
            _ => {
                println!("daemon unreachable");
                Ok(1)
            }
        },
        Err(_) => {
            println!("daemon not running");
            Ok(1)
        }
    }
}
