// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic cleanup: stuck jobs and aged-out queue files.

use crate::runner::Engine;
use relay_core::{epoch_secs, JobStatus};
use relay_storage::JobStore;
use std::time::Duration;

/// Convert jobs stuck in `processing` back to a usable state.
///
/// Three cases:
/// 1. result file exists but the status write was lost → fix to `completed`;
/// 2. the project is active in-memory (genuinely running) → skip;
/// 3. orphaned: past the stale threshold → "interrupted" result + `completed`,
///    otherwise reset to `pending` for retry.
pub fn reap_stale(engine: &Engine) {
    let now = epoch_secs();
    let threshold = engine.config.stale_threshold.as_secs_f64();
    let mut cleaned = 0usize;

    for path in engine.store.scan() {
        let Some(mut job) = JobStore::load_path(&path) else {
            tracing::warn!(path = %path.display(), "could not read job file during reap");
            continue;
        };
        if job.status != JobStatus::Processing {
            continue;
        }

        if engine.store.result_exists(&job.id) {
            tracing::info!(job = %job.id, "fixing completed job left in processing");
            job.status = JobStatus::Completed;
            save_reaped(engine, &job);
            cleaned += 1;
            continue;
        }

        if engine.scheduler.is_busy(job.project_key()) {
            continue;
        }

        let started = job.started_at.unwrap_or(job.created);
        let age = now - started;
        if age > threshold {
            tracing::warn!(job = %job.id, age_secs = age as u64, "orphaned job, marking interrupted");
            if let Err(e) = engine
                .store
                .write_result(&job.id, "Error: Job was interrupted. Please retry your request.")
            {
                tracing::warn!(job = %job.id, error = %e, "failed to write interrupted result");
                continue;
            }
            job.status = JobStatus::Completed;
        } else {
            tracing::info!(job = %job.id, "resetting recent orphaned job to pending");
            job.status = JobStatus::Pending;
            job.activity = Some("Queued (retry after restart)".to_string());
        }
        save_reaped(engine, &job);
        cleaned += 1;
    }

    if cleaned > 0 {
        tracing::info!(cleaned, "cleaned up stale jobs");
    }
}

fn save_reaped(engine: &Engine, job: &relay_core::JobRecord) {
    if let Err(e) = engine.store.save(job) {
        tracing::warn!(job = %job.id, error = %e, "failed to persist reaped job");
    }
}

/// Delete aged-out queue files: completed jobs with all their sidecars,
/// stuck question files (finishing their parent jobs), and orphaned locks.
pub fn reap_old(engine: &Engine) {
    let mut removed_jobs = 0usize;
    let mut removed_questions = 0usize;
    let mut removed_locks = 0usize;

    // Completed jobs past the age limit.
    for path in engine.store.scan() {
        let Some(job) = JobStore::load_path(&path) else {
            continue;
        };
        if job.status != JobStatus::Completed {
            continue;
        }
        if file_age(&path).is_some_and(|age| age > engine.config.old_job_age) {
            tracing::info!(job = %job.id, "deleting old completed job");
            engine.store.remove_job_files(&job.id);
            engine.store.cleanup_images(&job.id);
            removed_jobs += 1;
        }
    }

    // Stuck question files, plus their waiting parents.
    let queue_dir = engine.store.layout().queue_dir();
    for entry in read_dir_with_extension(&queue_dir, "questions") {
        if file_age(&entry).is_some_and(|age| age > engine.config.old_questions_age) {
            let job_id = entry
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            tracing::info!(job = %job_id, "deleting stuck questions file");
            let _ = std::fs::remove_file(&entry);
            removed_questions += 1;

            if let Some(mut job) = engine.store.load(&job_id) {
                if job.status == JobStatus::WaitingForAnswers {
                    if engine
                        .store
                        .write_result(&job_id, "Error: Question timed out - no answer provided.")
                        .is_ok()
                    {
                        job.status = JobStatus::Completed;
                        save_reaped(engine, &job);
                        tracing::info!(job = %job_id, "marked timed-out question job completed");
                    }
                }
            }
        }
    }

    // Orphaned lock files.
    for entry in read_dir_with_extension(&queue_dir, "lock") {
        if file_age(&entry).is_some_and(|age| age > engine.config.old_lock_age) {
            let _ = std::fs::remove_file(&entry);
            removed_locks += 1;
        }
    }

    let total = removed_jobs + removed_questions + removed_locks;
    if total > 0 {
        tracing::info!(
            total,
            jobs = removed_jobs,
            questions = removed_questions,
            locks = removed_locks,
            "old job cleanup removed files"
        );
    }
}

fn read_dir_with_extension(dir: &std::path::Path, ext: &str) -> Vec<std::path::PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|x| x == ext))
        .collect()
}

/// Age of a file by mtime, `None` when unreadable.
fn file_age(path: &std::path::Path) -> Option<Duration> {
    path.metadata().ok()?.modified().ok()?.elapsed().ok()
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
