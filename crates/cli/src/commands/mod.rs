// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command definitions and dispatch.

mod daemon;
mod device;
mod job;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "netrun", about = "Canary-first network configuration runner", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage the netrund daemon
    Daemon {
        #[command(subcommand)]
        command: daemon::DaemonCommand,
    },
    /// Manage the device inventory
    Device {
        #[command(subcommand)]
        command: device::DeviceCommand,
    },
    /// Run read-only status commands on one device
    Exec(device::ExecArgs),
    /// Create, run, and control jobs
    Job {
        #[command(subcommand)]
        command: job::JobCommand,
    },
}

/// Run one command, returning the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Daemon { command } => daemon::run(command).await,
        Command::Device { command } => device::run(command).await,
        Command::Exec(args) => device::exec(args).await,
        Command::Job { command } => job::run(command).await,
    }
}
