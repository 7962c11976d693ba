// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device inventory commands.

use crate::client::Client;
use crate::output;
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use nr_core::DeviceTarget;
use nr_wire::{Request, Response};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum DeviceCommand {
    /// Import devices from a CSV file, replacing the inventory
    Import {
        /// CSV file with host,device_type,username,password[,port,name,verify_cmds]
        file: PathBuf,
    },
    /// List the current inventory
    List,
}

#[derive(Args)]
pub struct ExecArgs {
    /// Target device as host[:port]
    pub device: String,
    /// Exec-mode commands to run (joined as separate lines)
    #[arg(required = true)]
    pub commands: Vec<String>,
}

pub async fn run(command: DeviceCommand) -> Result<i32> {
    let mut client = Client::connect().await?;
    match command {
        DeviceCommand::Import { file } => {
            let csv = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            match client.expect_ok(&Request::ImportDevices { csv }).await? {
                Response::ImportResult { devices, failed_rows } => {
                    output::print_import(&devices, &failed_rows);
                    Ok(0)
                }
                other => bail!("unexpected response: {other:?}"),
            }
        }
        DeviceCommand::List => match client.expect_ok(&Request::ListDevices).await? {
            Response::Devices { devices } => {
                output::print_devices(&devices);
                Ok(0)
            }
            other => bail!("unexpected response: {other:?}"),
        },
    }
}

pub async fn exec(args: ExecArgs) -> Result<i32> {
    let device = DeviceTarget::parse(&args.device)?;
    let commands = args.commands.join("\n");

    let mut client = Client::connect().await?;
    match client.expect_ok(&Request::StatusCommand { device, commands }).await? {
        Response::CommandOutput { output } => {
            println!("{output}");
            Ok(0)
        }
        other => bail!("unexpected response: {other:?}"),
    }
}
