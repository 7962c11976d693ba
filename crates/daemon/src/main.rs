// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! netrund: the network configuration runner daemon.

use nr_daemon::{env, lifecycle, listener, Config, DaemonCtx};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("startup failed: {e}");
            std::process::exit(1);
        }
    };
    let startup = match lifecycle::startup(&config) {
        Ok(startup) => startup,
        Err(e) => {
            error!("startup failed: {e}");
            std::process::exit(1);
        }
    };

    let worker_mode = env::worker_mode();
    let validator_mode = env::validator_mode();
    info!(?worker_mode, ?validator_mode, "starting netrund {}", env::PROTOCOL_VERSION);

    let ctx = Arc::new(DaemonCtx::build(
        worker_mode,
        validator_mode,
        env::simulated_delay(),
        env::history_limit(),
    ));

    // The lock file guards against a second daemon for our whole lifetime.
    let _lock_file = startup.lock_file;
    listener::serve(startup.listener, Arc::clone(&ctx)).await;

    lifecycle::cleanup(&config);
    info!("netrund stopped");
}
