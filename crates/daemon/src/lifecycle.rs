// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, logging, singleton PID lock.

use fs2::FileExt;
use relay_adapters::env;
use relay_storage::Layout;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another watcher is already running (PID {0})")]
    AlreadyRunning(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Daemon configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Which user's queue this instance serves.
    pub user: String,
    /// HTTP port of the external relay server (logged only).
    pub port: u16,
    /// Per-user directory layout.
    pub layout: Layout,
    /// Path to the watcher log file.
    pub log_path: PathBuf,
    /// Path to the singleton PID file.
    pub pid_path: PathBuf,
}

impl Config {
    /// Load configuration: `.env` first, then `RELAY_*` variables.
    pub fn load() -> Result<Self, LifecycleError> {
        let dir = env::relay_dir();
        env::load_dotenv(&dir);

        let user = env::relay_user();
        let layout = Layout::new(dir, &user);
        layout.ensure_dirs()?;

        Ok(Self {
            port: env::relay_port(),
            log_path: layout.log_path(),
            pid_path: layout.pid_path(),
            user,
            layout,
        })
    }
}

/// Holds the exclusive PID-file lock for the process lifetime.
///
/// The OS releases the flock when the descriptor closes, so a dead watcher
/// never blocks its successor.
#[derive(Debug)]
pub struct PidLock {
    _file: File,
}

/// Acquire the singleton lock on `watcher.pid` without blocking.
///
/// On contention, reports the PID recorded by the running instance.
pub fn acquire_pid_lock(path: &Path) -> Result<PidLock, LifecycleError> {
    // Avoid truncating before the lock is held - that would wipe the
    // running watcher's PID.
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    if file.try_lock_exclusive().is_err() {
        let existing = std::fs::read_to_string(path)
            .unwrap_or_default()
            .trim()
            .to_string();
        let existing = if existing.is_empty() {
            "unknown".to_string()
        } else {
            existing
        };
        return Err(LifecycleError::AlreadyRunning(existing));
    }

    let mut file = file;
    file.set_len(0)?;
    write!(file, "{}", std::process::id())?;
    file.flush()?;
    Ok(PidLock { _file: file })
}

/// Maximum log file size before rotation (5 MB).
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Number of rotated log files to keep (watcher.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the watcher log if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `watcher.log` → `.1` → `.2` → `.3`, deleting the oldest.
/// Best-effort: rotation failures do not block startup.
pub fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Install tracing: stderr plus a non-blocking file writer.
pub fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = config
        .log_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let log_name = config
        .log_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "watcher.log".to_string());

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
