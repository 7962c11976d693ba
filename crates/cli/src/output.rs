// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain-text rendering for CLI output.

use nr_core::{DeviceProfile, EventType, ExecutionEvent, JobRecord};
use nr_wire::{FailedRowEntry, JobSummary};

pub fn print_import(devices: &[DeviceProfile], failed_rows: &[FailedRowEntry]) {
    for device in devices {
        let outcome = if device.connection_ok {
            "ok".to_string()
        } else {
            format!("FAILED ({})", device.error_message.as_deref().unwrap_or("unknown"))
        };
        println!("{}:{}  {}  {}", device.host, device.port, device.device_type, outcome);
    }
    for row in failed_rows {
        println!("row {}: {}", row.row_number, row.error);
    }
    let ok = devices.iter().filter(|d| d.connection_ok).count();
    println!("{ok}/{} devices imported, {} rows failed", devices.len(), failed_rows.len());
}

pub fn print_devices(devices: &[DeviceProfile]) {
    if devices.is_empty() {
        println!("no devices imported");
        return;
    }
    for device in devices {
        let name = device.name.as_deref().unwrap_or("-");
        println!("{}:{}  {}  {}  verify:{}", device.host, device.port, device.device_type, name, device.verify_cmds.len());
    }
}

pub fn print_jobs(jobs: &[JobSummary]) {
    if jobs.is_empty() {
        println!("no jobs");
        return;
    }
    for job in jobs {
        let name = job.job_name.as_deref().unwrap_or("-");
        let duration = job
            .duration_seconds
            .map(|s| format!("{s:.1}s"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:9}  {}  devices:{}  {}",
            job.job_id, job.status, name, job.device_count, duration
        );
    }
}

pub fn print_job(job: &JobRecord) {
    println!("job:     {}", job.job_id);
    if let Some(name) = &job.job_name {
        println!("name:    {name}");
    }
    println!("status:  {}", job.status);
    println!("canary:  {}", job.canary);
    println!("devices:");
    for (key, result) in &job.device_results {
        let error = result.error.as_deref().unwrap_or("");
        println!("  {key}  {:9}  attempts:{}  {error}", result.status, result.attempts);
        if let Some(diff) = &result.diff {
            if !diff.is_empty() {
                for line in diff.lines() {
                    println!("    {line}");
                }
            }
        }
    }
}

pub fn print_event(event: &ExecutionEvent) {
    let device = event.device.as_ref().map(|d| d.as_str()).unwrap_or("-");
    match event.event_type {
        EventType::Log => {
            println!("[{}] {} {}", event.timestamp, device, event.message.as_deref().unwrap_or(""));
        }
        _ => {
            let status = event.status.as_deref().unwrap_or("");
            println!("[{}] {} {} {}", event.timestamp, event.event_type, device, status);
        }
    }
}
