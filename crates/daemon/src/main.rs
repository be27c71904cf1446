// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay watcher daemon (relayd)
//!
//! Watches a file-system job queue and supervises one worker process per
//! job, with per-project serialization and a bounded pool. One instance per
//! queue directory, enforced by an exclusive lock on the PID file.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lifecycle;

use lifecycle::{Config, LifecycleError};
use relay_engine::{Engine, EngineConfig, Supervisor};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("relayd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("relayd {}", env!("CARGO_PKG_VERSION"));
                println!("Relay watcher - processes queued jobs via the worker CLI");
                println!();
                println!("USAGE:");
                println!("    relayd");
                println!();
                println!("Watches the queue directory selected by RELAY_USER/RELAY_DIR.");
                println!("Producers drop <id>.json job files there; results appear as");
                println!("<id>.result sidecars.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: relayd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    lifecycle::rotate_log_if_needed(&config.log_path);
    let _log_guard = lifecycle::setup_logging(&config)?;

    // Singleton guard: the lock lives for the process lifetime; closing the
    // descriptor releases it.
    let _pid_lock = match lifecycle::acquire_pid_lock(&config.pid_path) {
        Ok(lock) => lock,
        Err(LifecycleError::AlreadyRunning(pid)) => {
            eprintln!("Another watcher is already running (PID {pid}). Exiting.");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        pid = std::process::id(),
        user = %config.user,
        port = config.port,
        "watcher starting"
    );

    let engine = Arc::new(Engine::new(config.layout.clone(), EngineConfig::default()));
    let supervisor = Supervisor::new(engine);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    supervisor.run(shutdown_rx).await;
    info!("watcher stopped");
    Ok(())
}
