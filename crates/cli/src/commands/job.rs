// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle commands.

use crate::client::Client;
use crate::output;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use nr_core::{DeviceTarget, JobId, JobSpec, JobStatus, VerifyMode};
use nr_wire::{Request, Response, RunOverrides};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum JobCommand {
    /// Create a job in QUEUED
    Create(CreateArgs),
    /// Run a job (background by default)
    Run(RunArgs),
    /// Job history, newest first
    List,
    /// Show one job with per-device results
    Show { job_id: String },
    /// The active job, if any
    Active,
    /// Pause a running job
    Pause { job_id: String },
    /// Resume a paused job
    Resume { job_id: String },
    /// Cancel a job
    Cancel { job_id: String },
    /// Print buffered events
    Events {
        job_id: String,
        #[arg(long, default_value_t = 0)]
        start: usize,
    },
    /// Stream events live until the job completes
    Watch {
        job_id: String,
        #[arg(long, default_value_t = 0)]
        start: usize,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    /// Canary device as host[:port]; executed first, gates the fan-out
    #[arg(long)]
    pub canary: String,
    /// Target devices (host[:port]); defaults to the whole inventory
    #[arg(long = "device")]
    pub devices: Vec<String>,
    /// Configuration commands, one per line
    #[arg(long, conflicts_with = "commands_file")]
    pub commands: Option<String>,
    /// Read the command block from a file
    #[arg(long)]
    pub commands_file: Option<PathBuf>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub creator: Option<String>,
    /// Verification scope: none, canary, or all
    #[arg(long, default_value = "all")]
    pub verify_mode: String,
    /// Override per-device verify commands
    #[arg(long = "verify-cmd")]
    pub verify_cmds: Vec<String>,
    #[arg(long, default_value_t = 5)]
    pub concurrency: usize,
    #[arg(long, default_value_t = 0)]
    pub stagger_ms: u64,
    /// Keep admitting devices after a failure
    #[arg(long)]
    pub no_stop_on_error: bool,
}

#[derive(Args)]
pub struct RunArgs {
    pub job_id: String,
    /// Wait for the terminal status and exit with its code
    #[arg(long)]
    pub wait: bool,
    /// Stream events while waiting (implies --wait)
    #[arg(long)]
    pub watch: bool,
    #[arg(long)]
    pub concurrency: Option<usize>,
    #[arg(long)]
    pub stagger_ms: Option<u64>,
    #[arg(long)]
    pub stop_on_error: Option<bool>,
    /// Non-canary retry limit (0-3)
    #[arg(long)]
    pub retry: Option<u32>,
    #[arg(long)]
    pub retry_backoff_ms: Option<u64>,
}

fn parse_job_id(s: &str) -> Result<JobId> {
    JobId::parse(s).map_err(|_| anyhow!("invalid job id: {s}"))
}

fn parse_verify_mode(s: &str) -> Result<VerifyMode> {
    match s {
        "none" => Ok(VerifyMode::None),
        "canary" => Ok(VerifyMode::Canary),
        "all" => Ok(VerifyMode::All),
        other => bail!("unknown verify mode: {other} (expected none, canary, or all)"),
    }
}

/// Exit code for a terminal job status.
pub fn exit_code(status: JobStatus) -> i32 {
    match status {
        JobStatus::Completed => 0,
        JobStatus::Cancelled => 130,
        _ => 1,
    }
}

pub async fn run(command: JobCommand) -> Result<i32> {
    match command {
        JobCommand::Create(args) => create(args).await,
        JobCommand::Run(args) => run_job(args).await,
        JobCommand::List => list().await,
        JobCommand::Show { job_id } => show(&job_id).await,
        JobCommand::Active => active().await,
        JobCommand::Pause { job_id } => simple(Request::PauseJob { job_id: parse_job_id(&job_id)? }, "paused").await,
        JobCommand::Resume { job_id } => simple(Request::ResumeJob { job_id: parse_job_id(&job_id)? }, "resumed").await,
        JobCommand::Cancel { job_id } => simple(Request::CancelJob { job_id: parse_job_id(&job_id)? }, "cancel requested").await,
        JobCommand::Events { job_id, start } => events(&job_id, start).await,
        JobCommand::Watch { job_id, start } => watch(&job_id, start).await,
    }
}

async fn create(args: CreateArgs) -> Result<i32> {
    let commands = match (&args.commands, &args.commands_file) {
        (Some(block), _) => block.clone(),
        (None, Some(file)) => std::fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?,
        (None, None) => bail!("one of --commands or --commands-file is required"),
    };

    let mut spec = JobSpec::new(DeviceTarget::parse(&args.canary)?, commands)
        .verify_mode(parse_verify_mode(&args.verify_mode)?)
        .verify_cmds(args.verify_cmds)
        .concurrency_limit(args.concurrency)
        .stagger_delay_ms(args.stagger_ms)
        .stop_on_error(!args.no_stop_on_error);
    spec.job_name = args.name;
    spec.creator = args.creator;
    spec.devices = args
        .devices
        .iter()
        .map(|d| DeviceTarget::parse(d))
        .collect::<Result<Vec<_>, _>>()?;

    let mut client = Client::connect().await?;
    match client.expect_ok(&Request::CreateJob { spec }).await? {
        Response::JobCreated { job_id, status } => {
            println!("{job_id} {status}");
            Ok(0)
        }
        other => bail!("unexpected response: {other:?}"),
    }
}

async fn run_job(args: RunArgs) -> Result<i32> {
    let job_id = parse_job_id(&args.job_id)?;
    let run = RunOverrides {
        concurrency_limit: args.concurrency,
        stagger_delay_ms: args.stagger_ms,
        stop_on_error: args.stop_on_error,
        non_canary_retry_limit: args.retry,
        retry_backoff_ms: args.retry_backoff_ms,
    };

    let mut client = Client::connect().await?;
    if args.watch {
        // Launch in the background, then stream events on a second
        // connection until the job completes.
        match client.expect_ok(&Request::RunJob { job_id, run, wait: false }).await? {
            Response::RunStarted { .. } => watch_stream(job_id, 0).await,
            other => bail!("unexpected response: {other:?}"),
        }
    } else if args.wait {
        match client.expect_ok(&Request::RunJob { job_id, run, wait: true }).await? {
            Response::RunFinished { status, .. } => {
                println!("{status}");
                Ok(exit_code(status))
            }
            other => bail!("unexpected response: {other:?}"),
        }
    } else {
        match client.expect_ok(&Request::RunJob { job_id, run, wait: false }).await? {
            Response::RunStarted { .. } => {
                println!("run started");
                Ok(0)
            }
            other => bail!("unexpected response: {other:?}"),
        }
    }
}

async fn simple(request: Request, verb: &str) -> Result<i32> {
    let mut client = Client::connect().await?;
    match client.expect_ok(&request).await? {
        Response::Ok => {
            println!("{verb}");
            Ok(0)
        }
        other => bail!("unexpected response: {other:?}"),
    }
}

async fn list() -> Result<i32> {
    let mut client = Client::connect().await?;
    match client.expect_ok(&Request::ListJobs).await? {
        Response::Jobs { jobs } => {
            output::print_jobs(&jobs);
            Ok(0)
        }
        other => bail!("unexpected response: {other:?}"),
    }
}

async fn active() -> Result<i32> {
    let mut client = Client::connect().await?;
    match client.expect_ok(&Request::ActiveJob).await? {
        Response::ActiveJob { job: Some(job) } => {
            output::print_jobs(std::slice::from_ref(&job));
            Ok(0)
        }
        Response::ActiveJob { job: None } => {
            println!("no active job");
            Ok(0)
        }
        other => bail!("unexpected response: {other:?}"),
    }
}

async fn show(job_id: &str) -> Result<i32> {
    let job_id = parse_job_id(job_id)?;
    let mut client = Client::connect().await?;
    match client.expect_ok(&Request::GetJob { job_id }).await? {
        Response::Job { job } => {
            output::print_job(&job);
            Ok(0)
        }
        other => bail!("unexpected response: {other:?}"),
    }
}

async fn events(job_id: &str, start: usize) -> Result<i32> {
    let job_id = parse_job_id(job_id)?;
    let mut client = Client::connect().await?;
    match client.expect_ok(&Request::Events { job_id, start_index: start }).await? {
        Response::Events { events } => {
            for event in &events {
                output::print_event(event);
            }
            Ok(0)
        }
        other => bail!("unexpected response: {other:?}"),
    }
}

async fn watch(job_id: &str, start: usize) -> Result<i32> {
    watch_stream(parse_job_id(job_id)?, start).await
}

fn parse_terminal_status(s: &str) -> Option<JobStatus> {
    match s {
        "completed" => Some(JobStatus::Completed),
        "failed" => Some(JobStatus::Failed),
        "cancelled" => Some(JobStatus::Cancelled),
        _ => None,
    }
}

/// Stream events until `job_complete`, mapping the terminal status to the
/// process exit code.
async fn watch_stream(job_id: JobId, start_index: usize) -> Result<i32> {
    let mut client = Client::connect().await?;
    client.send(&Request::Watch { job_id, start_index }).await?;

    let mut terminal = None;
    while let Some(event) = client.next_event().await? {
        output::print_event(&event);
        if event.is_final() {
            terminal = event.status.as_deref().and_then(parse_terminal_status);
            break;
        }
    }
    let status = terminal.ok_or_else(|| anyhow!("event stream ended without job_complete"))?;
    Ok(exit_code(status))
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
