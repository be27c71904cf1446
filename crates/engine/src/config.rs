// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tuning knobs.

use std::path::PathBuf;
use std::time::Duration;

/// Supervisor and runner configuration.
///
/// Defaults mirror the deployed watcher; tests override the intervals and
/// directories freely.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Max different projects running simultaneously.
    pub max_parallel_projects: usize,
    /// Per-job wall-clock ceiling before the process group is killed.
    pub max_job_runtime: Duration,
    /// Supervisor scan tick and runner select timeout.
    pub tick: Duration,
    /// Min delay between job-record activity updates (backpressure against
    /// update storms).
    pub activity_interval: Duration,
    /// Heartbeat cadence in the supervisor loop.
    pub heartbeat_interval: Duration,
    /// How often to look for jobs stuck in `processing`.
    pub stale_check_interval: Duration,
    /// Age past which a stuck `processing` job is declared interrupted.
    pub stale_threshold: Duration,
    pub old_cleanup_enabled: bool,
    pub old_cleanup_interval: Duration,
    pub old_job_age: Duration,
    pub old_questions_age: Duration,
    pub old_lock_age: Duration,
    /// Base directory project names resolve under.
    pub projects_dir: PathBuf,
    /// Worker state root holding session artifacts.
    pub claude_config_dir: PathBuf,
    /// How long shutdown waits for in-flight jobs.
    pub shutdown_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parallel_projects: 4,
            max_job_runtime: Duration::from_secs(30 * 60),
            tick: Duration::from_millis(500),
            activity_interval: Duration::from_secs(2),
            heartbeat_interval: Duration::from_secs(3),
            stale_check_interval: Duration::from_secs(120),
            stale_threshold: Duration::from_secs(5 * 60),
            old_cleanup_enabled: true,
            old_cleanup_interval: Duration::from_secs(3600),
            old_job_age: Duration::from_secs(3 * 24 * 3600),
            old_questions_age: Duration::from_secs(2 * 24 * 3600),
            old_lock_age: Duration::from_secs(24 * 3600),
            projects_dir: relay_adapters::env::projects_dir(),
            claude_config_dir: relay_adapters::env::claude_config_dir(),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}
