// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job child-process runner.
//!
//! Owns one worker process for the lifetime of one job:
//! claim → prepare → spawn → pump → finalize → cleanup. Every failure path
//! converts into an `Error: …` result file plus a terminal status, so a job
//! never stays visible as `processing` after its runner returns.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::images;
use crate::prompt::{build_prompt, PromptContext};
use crate::scheduler::ActiveProjects;
use relay_adapters::{
    build_worker_invocation, detect_auth_error, is_remote_model, kill_group, parse_stream,
    shutdown_group, spawn_worker_pty, strip_control_sequences, stream_completion, SessionMode,
    RemoteEndpoint, RemoteError,
};
use relay_core::{epoch_secs, IdGen, JobRecord, JobStatus, QuestionsFile, UuidIdGen, DEFAULT_PROJECT};
use relay_core::question::detect_questions;
use relay_storage::{HeartbeatWriter, HistoryStore, JobStore, Layout, SessionRegistry};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;

/// Shared state for the supervisor and all runner tasks.
pub struct Engine {
    pub config: EngineConfig,
    pub store: JobStore,
    pub sessions: SessionRegistry,
    pub history: HistoryStore,
    pub heartbeat: HeartbeatWriter,
    pub scheduler: ActiveProjects,
}

impl Engine {
    pub fn new(layout: Layout, config: EngineConfig) -> Self {
        Self {
            store: JobStore::new(layout.clone()),
            sessions: SessionRegistry::new(layout.sessions_path(), &config.claude_config_dir),
            history: HistoryStore::new(layout.history_dir()),
            heartbeat: HeartbeatWriter::new(layout.heartbeat_path()),
            scheduler: ActiveProjects::new(config.max_parallel_projects),
            config,
        }
    }
}

/// Resolve a project name to its working directory.
///
/// Exact match first; case-insensitive only for names without `/` (scoped
/// names must match exactly). Returns `None` for the sentinel project and
/// for unknown names - the caller falls back to the projects root.
pub fn resolve_project_dir(base: &Path, project: &str) -> Option<PathBuf> {
    if project.is_empty() || project == DEFAULT_PROJECT {
        return None;
    }

    let exact = base.join(project);
    if exact.exists() {
        return Some(exact);
    }

    if !project.contains('/') {
        let lowered = project.to_lowercase();
        if let Ok(entries) = std::fs::read_dir(base) {
            for entry in entries.filter_map(|e| e.ok()) {
                if entry.path().is_dir()
                    && entry.file_name().to_string_lossy().to_lowercase() == lowered
                {
                    return Some(entry.path());
                }
            }
        }
    }

    tracing::warn!(project, "project directory not found");
    None
}

/// Persist a job record under its advisory lock; contended updates are
/// skipped (they are periodic and will be retried).
fn update_job(engine: &Engine, job: &JobRecord) {
    match engine.store.try_lock(&job.id) {
        Ok(Some(_lock)) => {
            if let Err(e) = engine.store.save(job) {
                tracing::warn!(job = %job.id, error = %e, "failed to update job record");
            }
        }
        Ok(None) => {
            tracing::debug!(job = %job.id, "lock contention, skipping job update");
        }
        Err(e) => {
            tracing::warn!(job = %job.id, error = %e, "failed to lock job record");
        }
    }
}

/// Persist a status transition. Unlike [`update_job`] this never skips: a
/// terminal status outranks the advisory lock (contention here only means a
/// producer is mid-poll, and the write is atomic either way).
fn commit_job(engine: &Engine, job: &JobRecord) {
    let lock = engine.store.try_lock(&job.id).ok().flatten();
    if let Err(e) = engine.store.save(job) {
        tracing::error!(job = %job.id, error = %e, "failed to persist job status");
    }
    drop(lock);
}

/// Process a single job file. Returns true if the job was processed (or
/// terminally failed), false if it was skipped.
pub async fn process_job(engine: &Engine, job_path: &Path) -> bool {
    // Claim: lock, re-read, verify still eligible.
    let lock = match relay_storage::FileLock::try_acquire(job_path) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            tracing::debug!(path = %job_path.display(), "job file locked elsewhere, skipping");
            return false;
        }
        Err(e) => {
            tracing::warn!(path = %job_path.display(), error = %e, "could not lock job file");
            return false;
        }
    };

    if !job_path.exists() {
        tracing::info!(path = %job_path.display(), "job file no longer exists, skipping");
        return false;
    }

    let Some(mut job) = JobStore::load_path(job_path) else {
        tracing::error!(path = %job_path.display(), "failed to read job file");
        return false;
    };

    if !job.status.is_dispatchable() {
        return false;
    }

    let project = job.project_key().to_string();
    if !engine.scheduler.try_mark_active(&project) {
        // Project busy or pool full - leave the job for a later scan.
        drop(lock);
        return false;
    }

    let start = Instant::now();
    job.status = JobStatus::Processing;
    job.started_at = Some(epoch_secs());
    job.activity = Some("Starting Claude...".to_string());
    if let Err(e) = engine.store.save(&job) {
        tracing::error!(job = %job.id, error = %e, "failed to mark job processing");
        engine.scheduler.mark_idle(&project);
        return false;
    }
    drop(lock);

    engine.heartbeat.write(Some(&job.id), Some("Starting Claude..."));
    tracing::info!(
        job = %job.id,
        project = %project,
        message = relay_core::id::ShortId::short(job.message.as_str(), 50),
        "processing job"
    );

    let outcome = run_claimed(engine, &mut job, start).await;
    engine.scheduler.mark_idle(&project);

    match outcome {
        Ok(processed) => processed,
        Err(e) => {
            tracing::error!(job = %job.id, error = %e, "job failed");
            let _ = engine.store.write_result(&job.id, &format!("Error: {e}"));
            // Force a terminal status so the job cannot appear active.
            if let Some(mut current) = engine.store.load(&job.id) {
                current.status = JobStatus::Completed;
                commit_job(engine, &current);
            }
            engine.store.cleanup_images(&job.id);
            true
        }
    }
}

async fn run_claimed(
    engine: &Engine,
    job: &mut JobRecord,
    start: Instant,
) -> Result<bool, EngineError> {
    let layout = engine.store.layout().clone();
    let project_dir = resolve_project_dir(&engine.config.projects_dir, job.project_key());

    let image_paths = images::save_images(&layout, &job.id, &job.images);
    if !image_paths.is_empty() {
        tracing::info!(job = %job.id, count = image_paths.len(), "attached images");
    }

    if is_remote_model(&job.model) {
        return run_remote_job(engine, job, start).await;
    }

    // Session selection: format jobs get a fresh single-turn session, all
    // others share the project's persistent session.
    let (session, max_turns) = if job.job_type.is_format() {
        (SessionMode::New(UuidIdGen.next()), Some(1))
    } else {
        let (id, is_new) = engine
            .sessions
            .get_or_create(job.project_key(), project_dir.as_deref());
        let mode = if is_new {
            SessionMode::New(id)
        } else {
            SessionMode::Resume(id)
        };
        (mode, None)
    };

    let prompt = build_prompt(&PromptContext {
        job_id: &job.id,
        message: &job.message,
        job_type: job.job_type,
        context_answers: &job.context_answers,
        image_paths: &image_paths,
        projects_dir: &engine.config.projects_dir,
        screenshots_dir: &layout.screenshots_dir(),
        temp_dir: &layout.temp_dir(),
    });

    let invocation = build_worker_invocation(&job.model, &session, max_turns, &prompt);
    let cwd = project_dir.unwrap_or_else(|| {
        tracing::warn!(
            project = job.project_key(),
            "using projects root as working directory"
        );
        engine.config.projects_dir.clone()
    });

    let mut pty = spawn_worker_pty(&invocation.program, &invocation.args, &cwd)?;
    let mut reader = pty.master_reader()?;
    tracing::info!(job = %job.id, pid = ?pty.pid(), "worker started");

    // Pump: read PTY output, snapshot the stream sidecar, throttle activity
    // updates, and enforce the runtime ceiling.
    let mut output = String::new();
    let mut buf = [0u8; 4096];
    let mut timed_out = false;
    let mut last_activity = Instant::now();

    loop {
        if start.elapsed() > engine.config.max_job_runtime {
            tracing::error!(
                job = %job.id,
                elapsed_secs = start.elapsed().as_secs(),
                "job timed out, killing worker"
            );
            timed_out = true;
            shutdown_group(&mut pty.child, Duration::from_secs(5)).await;
            break;
        }

        match tokio::time::timeout(engine.config.tick, reader.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                output.push_str(&String::from_utf8_lossy(&buf[..n]));
                let update = parse_stream(&output);

                if let Err(e) = engine.store.write_stream(&job.id, &output) {
                    tracing::warn!(job = %job.id, error = %e, "failed to write stream file");
                }

                if last_activity.elapsed() >= engine.config.activity_interval {
                    last_activity = Instant::now();
                    // Re-read so concurrent producer edits are not clobbered.
                    if let Some(mut current) = engine.store.load(&job.id) {
                        current.activity = Some(update.activity.clone());
                        update_job(engine, &current);
                    }
                    engine.heartbeat.write(Some(&job.id), Some(&update.activity));
                }
            }
            Ok(Err(e)) => {
                // The master returns EIO once the child exits and the slave
                // side closes; this is the normal end of stream.
                tracing::debug!(job = %job.id, error = %e, "PTY read ended");
                break;
            }
            Err(_elapsed) => {
                if pty.child.try_wait()?.is_some() {
                    // Child exited; drain whatever is still buffered.
                    while let Ok(Ok(n)) =
                        tokio::time::timeout(Duration::from_millis(100), reader.read(&mut buf))
                            .await
                    {
                        if n == 0 {
                            break;
                        }
                        output.push_str(&String::from_utf8_lossy(&buf[..n]));
                    }
                    break;
                }
            }
        }
    }

    // Reap the child; escalate if it lingers after its output closed.
    let exit_code = match tokio::time::timeout(Duration::from_secs(5), pty.child.wait()).await {
        Ok(Ok(status)) => status.code(),
        Ok(Err(e)) => {
            tracing::warn!(job = %job.id, error = %e, "failed to wait for worker");
            None
        }
        Err(_) => {
            tracing::warn!(job = %job.id, "worker did not exit cleanly, killing");
            if let Some(pid) = pty.pid() {
                kill_group(pid);
            }
            pty.child.wait().await.ok().and_then(|s| s.code())
        }
    };

    let response = if timed_out {
        format!(
            "Error: Job timed out after {} minutes. The task may be too complex or the worker may be stuck.",
            engine.config.max_job_runtime.as_secs() / 60
        )
    } else {
        finalize_response(&job.id, &output, exit_code)
    };
    let response = strip_control_sequences(&response);
    let response = if response.is_empty() {
        "No response".to_string()
    } else {
        response
    };

    // Question gate: pause instead of completing when the turn ended in an
    // unanswered question and the job type permits pausing.
    if !timed_out {
        let (questions, should_wait) = detect_questions(&response);
        if should_wait && !questions.is_empty() && job.job_type.allows_pausing() {
            let count = questions.len();
            tracing::info!(job = %job.id, count, "detected questions, waiting for answers");
            engine.store.write_questions(&QuestionsFile {
                job_id: job.id.clone(),
                questions,
                response_so_far: response.clone(),
                waiting: true,
            })?;
            job.status = JobStatus::WaitingForAnswers;
            job.activity = Some(format!("Waiting for {count} answer(s)..."));
            commit_job(engine, job);
            engine
                .heartbeat
                .write(Some(&job.id), Some(&format!("Waiting for {count} answer(s)")));
            return Ok(true);
        }
    }

    commit_result(engine, job, &response)?;
    Ok(true)
}

/// Build the final response from the accumulated stream.
///
/// Falls back to auth-failure signatures and then to an exit-code synthesis
/// when the event stream produced no text.
fn finalize_response(job_id: &str, raw: &str, exit_code: Option<i32>) -> String {
    let mut response = parse_stream(raw).text;

    if response.is_empty() {
        if let Some(diagnostic) = detect_auth_error(raw) {
            tracing::error!(job = %job_id, "API key error detected");
            response = diagnostic;
        }
    }

    if response.is_empty() {
        if let Some(code) = exit_code.filter(|c| *c != 0) {
            tracing::error!(job = %job_id, code, "worker exited with error and no output");
            let tail = if raw.trim().is_empty() {
                "(no output)"
            } else {
                clip(raw, 1000)
            };
            response = format!("Error: Claude process exited with code {code}.\n\nOutput: {tail}");
        }
    }

    response
}

/// Commit: result sidecar, terminal status, history, teardown.
fn commit_result(engine: &Engine, job: &mut JobRecord, response: &str) -> Result<(), EngineError> {
    engine.store.write_result(&job.id, response)?;

    job.status = JobStatus::Completed;
    job.activity = Some("Complete".to_string());
    commit_job(engine, job);

    if job.job_type.records_history() {
        if let Err(e) = engine.history.append(job.project_key(), &job.message, response) {
            tracing::error!(job = %job.id, error = %e, "failed to save history");
        }
    }

    engine.store.delete_stream(&job.id);
    engine.store.cleanup_images(&job.id);

    let total = engine.heartbeat.increment_jobs();
    engine.heartbeat.write(None, Some("Idle - waiting for jobs"));
    tracing::info!(job = %job.id, total, "job complete");
    Ok(())
}

/// Remote-backend path: same job contract, streamed over HTTPS. No session
/// persistence and no question gating.
async fn run_remote_job(
    engine: &Engine,
    job: &mut JobRecord,
    start: Instant,
) -> Result<bool, EngineError> {
    tracing::info!(job = %job.id, model = %job.model, "processing job with remote API");

    let endpoint = match RemoteEndpoint::resolve(&job.model) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            tracing::error!(job = %job.id, error = %e, "remote endpoint unavailable");
            fail_remote_job(engine, job, &e);
            return Ok(true);
        }
    };

    job.activity = Some(format!("Calling {}...", endpoint.model_id));
    update_job(engine, job);
    engine
        .heartbeat
        .write(Some(&job.id), Some(&format!("Calling {}...", endpoint.model_id)));

    let job_id = job.id.clone();
    let mut event_lines: Vec<String> = Vec::new();
    let mut last_activity = Instant::now();

    let result = stream_completion(&endpoint, &job.message, |delta| {
        // Synthetic assistant events keep the stream sidecar consumable by
        // the same UI path as CLI jobs.
        event_lines.push(relay_adapters::remote::synthetic_event_line(delta));
        if let Err(e) = engine.store.write_stream(&job_id, &event_lines.join("\n")) {
            tracing::warn!(job = %job_id, error = %e, "failed to write stream file");
        }
        if last_activity.elapsed() >= engine.config.activity_interval {
            last_activity = Instant::now();
            let elapsed = start.elapsed().as_secs();
            if let Some(mut current) = engine.store.load(&job_id) {
                current.activity = Some(format!("Generating... ({elapsed}s)"));
                update_job(engine, &current);
            }
            engine.heartbeat.write(Some(&job_id), Some("Generating..."));
        }
    })
    .await;

    match result {
        Ok(text) => {
            let elapsed = start.elapsed().as_secs_f64();
            job.result = Some(text.clone());
            job.completed_at = Some(epoch_secs());
            job.elapsed = Some(elapsed);
            tracing::info!(job = %job.id, model = %job.model, elapsed, "remote job completed");
            commit_result(engine, job, &text)?;
            Ok(true)
        }
        Err(e) => {
            tracing::error!(job = %job.id, error = %e, "remote job failed");
            fail_remote_job(engine, job, &e);
            Ok(true)
        }
    }
}

/// Terminal `error` status for remote failures, with the diagnostic in both
/// the record and the result sidecar.
fn fail_remote_job(engine: &Engine, job: &mut JobRecord, error: &RemoteError) {
    job.status = JobStatus::Error;
    job.error = Some(error.to_string());
    commit_job(engine, job);
    let _ = engine.store.write_result(&job.id, &format!("Error: {error}"));
    engine.store.cleanup_images(&job.id);
}

/// Truncate to at most `max` bytes on a char boundary.
fn clip(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
