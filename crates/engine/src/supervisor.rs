// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor loop: scan the queue, dispatch runners, reap, heartbeat.

use crate::reaper;
use crate::runner::{process_job, Engine};
use relay_storage::JobStore;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

/// Owns the main loop; runner tasks share the [`Engine`].
pub struct Supervisor {
    engine: Arc<Engine>,
}

impl Supervisor {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Run until `shutdown` flips to true (or its sender is dropped).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let engine = &self.engine;

        // Recover jobs orphaned by a previous run before accepting new work.
        reaper::reap_stale(engine);

        tracing::info!(
            queue = %engine.store.layout().queue_dir().display(),
            max_runtime_mins = engine.config.max_job_runtime.as_secs() / 60,
            max_parallel = engine.config.max_parallel_projects,
            "watching for jobs"
        );

        let mut tasks: JoinSet<()> = JoinSet::new();
        let mut inflight: HashSet<PathBuf> = HashSet::new();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<PathBuf>();

        engine.heartbeat.write(None, Some("Idle - waiting for jobs"));
        let mut last_heartbeat = Instant::now();
        let mut last_stale_check = Instant::now();
        let mut last_old_cleanup = Instant::now();

        loop {
            if *shutdown.borrow() {
                break;
            }

            // Drain finished runner tasks (log panics, free their job files).
            while let Some(result) = tasks.try_join_next() {
                if let Err(e) = result {
                    tracing::error!(error = %e, "job task failed");
                }
            }
            while let Ok(path) = done_rx.try_recv() {
                inflight.remove(&path);
            }

            if last_heartbeat.elapsed() >= engine.config.heartbeat_interval {
                last_heartbeat = Instant::now();
                let active = engine.scheduler.active_count();
                let status = if active > 0 {
                    format!("Processing {active} project(s)")
                } else {
                    "Idle - waiting for jobs".to_string()
                };
                engine.heartbeat.write(None, Some(&status));
            }

            if last_stale_check.elapsed() >= engine.config.stale_check_interval {
                last_stale_check = Instant::now();
                reaper::reap_stale(engine);
            }

            if engine.config.old_cleanup_enabled
                && last_old_cleanup.elapsed() >= engine.config.old_cleanup_interval
            {
                last_old_cleanup = Instant::now();
                reaper::reap_old(engine);
            }

            // Scan for dispatchable jobs. Peeking here is lock-free; the
            // runner re-verifies under the job's lock before claiming.
            for path in engine.store.scan() {
                if inflight.contains(&path) {
                    continue;
                }
                let Some(job) = JobStore::load_path(&path) else {
                    continue;
                };
                if !job.status.is_dispatchable() {
                    continue;
                }
                if engine.scheduler.is_busy(job.project_key()) {
                    continue;
                }

                tracing::info!(
                    job = %job.id,
                    project = %job.project_key(),
                    "submitting job to runner"
                );
                inflight.insert(path.clone());
                let engine = Arc::clone(&self.engine);
                let done = done_tx.clone();
                tasks.spawn(async move {
                    process_job(&engine, &path).await;
                    let _ = done.send(path);
                });
            }

            tokio::select! {
                _ = tokio::time::sleep(engine.config.tick) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        // Graceful shutdown: no new dispatches, bounded wait for in-flight.
        tracing::info!(active = tasks.len(), "waiting for active jobs to complete");
        let drain = async {
            while tasks.join_next().await.is_some() {}
        };
        if tokio::time::timeout(engine.config.shutdown_grace, drain)
            .await
            .is_err()
        {
            tracing::warn!("shutdown grace period elapsed with jobs still running");
        }
        tracing::info!("shutdown complete");
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
