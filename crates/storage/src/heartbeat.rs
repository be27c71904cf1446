// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher liveness heartbeat.
//!
//! Written by the supervisor and by runners on activity updates so an
//! external health monitor can tell a live watcher from a wedged one.

use crate::atomic::write_json_atomic;
use parking_lot::Mutex;
use relay_core::epoch_secs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Contents of `watcher.heartbeat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub timestamp: f64,
    pub pid: u32,
    pub jobs_processed: u64,
    pub current_job: Option<String>,
    pub activity: Option<String>,
}

/// Serialized heartbeat writer shared between the supervisor and runners.
pub struct HeartbeatWriter {
    path: PathBuf,
    pid: u32,
    jobs_processed: AtomicU64,
    write_guard: Mutex<()>,
}

impl HeartbeatWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pid: std::process::id(),
            jobs_processed: AtomicU64::new(0),
            write_guard: Mutex::new(()),
        }
    }

    /// Write the heartbeat file. Failures are logged, never propagated - a
    /// missed heartbeat must not take a job down with it.
    pub fn write(&self, current_job: Option<&str>, activity: Option<&str>) {
        let beat = Heartbeat {
            timestamp: epoch_secs(),
            pid: self.pid,
            jobs_processed: self.jobs_processed.load(Ordering::Relaxed),
            current_job: current_job.map(String::from),
            activity: activity.map(String::from),
        };
        let _guard = self.write_guard.lock();
        if let Err(e) = write_json_atomic(&self.path, &beat) {
            tracing::warn!(error = %e, "failed to write heartbeat");
        }
    }

    /// Bump the processed-jobs counter, returning the new total.
    pub fn increment_jobs(&self) -> u64 {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
