// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::EngineConfig;
use relay_core::{epoch_secs, JobRecord, JobType};
use relay_storage::{Layout, DEFAULT_USER};
use std::time::Duration;
use tempfile::TempDir;

fn engine(dir: &TempDir) -> Engine {
    let layout = Layout::new(dir.path().join("relay"), DEFAULT_USER);
    layout.ensure_dirs().unwrap();
    let config = EngineConfig {
        projects_dir: dir.path().join("projects"),
        claude_config_dir: dir.path().join("claude"),
        ..EngineConfig::default()
    };
    Engine::new(layout, config)
}

fn job(id: &str, status: JobStatus, started_at: Option<f64>) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        status,
        message: "hello".to_string(),
        model: "sonnet".to_string(),
        project: "demo".to_string(),
        images: Vec::new(),
        created: epoch_secs() - 1000.0,
        started_at,
        completed_at: None,
        elapsed: None,
        activity: None,
        context_answers: String::new(),
        job_type: JobType::Chat,
        result: None,
        error: None,
        personality: None,
    }
}

#[test]
fn processing_with_result_is_fixed_to_completed() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    engine
        .store
        .save(&job("ab12", JobStatus::Processing, Some(epoch_secs())))
        .unwrap();
    engine.store.write_result("ab12", "done").unwrap();

    reap_stale(&engine);
    assert_eq!(engine.store.load("ab12").unwrap().status, JobStatus::Completed);
}

#[test]
fn active_project_is_skipped() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    engine
        .store
        .save(&job("ab12", JobStatus::Processing, Some(epoch_secs() - 4000.0)))
        .unwrap();
    assert!(engine.scheduler.try_mark_active("demo"));

    reap_stale(&engine);
    assert_eq!(engine.store.load("ab12").unwrap().status, JobStatus::Processing);
}

#[test]
fn old_orphan_is_marked_interrupted() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    engine
        .store
        .save(&job("ab12", JobStatus::Processing, Some(epoch_secs() - 400.0)))
        .unwrap();

    reap_stale(&engine);
    assert_eq!(engine.store.load("ab12").unwrap().status, JobStatus::Completed);
    let result = engine.store.read_result("ab12").unwrap();
    assert!(result.starts_with("Error: Job was interrupted"));
}

#[test]
fn recent_orphan_is_reset_to_pending() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    engine
        .store
        .save(&job("ab12", JobStatus::Processing, Some(epoch_secs() - 30.0)))
        .unwrap();

    reap_stale(&engine);
    let reaped = engine.store.load("ab12").unwrap();
    assert_eq!(reaped.status, JobStatus::Pending);
    assert_eq!(reaped.activity.as_deref(), Some("Queued (retry after restart)"));
    assert!(!engine.store.result_exists("ab12"));
}

#[test]
fn pending_jobs_are_untouched_by_stale_reap() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    engine.store.save(&job("ab12", JobStatus::Pending, None)).unwrap();

    reap_stale(&engine);
    assert_eq!(engine.store.load("ab12").unwrap().status, JobStatus::Pending);
}

#[test]
fn old_completed_jobs_are_deleted_with_sidecars() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine(&dir);
    engine.config.old_job_age = Duration::ZERO;
    engine.store.save(&job("ab12", JobStatus::Completed, None)).unwrap();
    engine.store.write_result("ab12", "done").unwrap();
    engine.store.write_stream("ab12", "partial").unwrap();

    reap_old(&engine);
    assert!(engine.store.load("ab12").is_none());
    assert!(!engine.store.result_exists("ab12"));
    assert!(!engine.store.layout().stream_path("ab12").exists());
}

#[test]
fn fresh_completed_jobs_are_kept() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    engine.store.save(&job("ab12", JobStatus::Completed, None)).unwrap();

    reap_old(&engine);
    assert!(engine.store.load("ab12").is_some());
}

#[test]
fn stuck_questions_finish_their_parent_job() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine(&dir);
    engine.config.old_questions_age = Duration::ZERO;
    engine
        .store
        .save(&job("ab12", JobStatus::WaitingForAnswers, Some(epoch_secs())))
        .unwrap();
    std::fs::write(engine.store.layout().questions_path("ab12"), "{}").unwrap();

    reap_old(&engine);
    assert!(!engine.store.layout().questions_path("ab12").exists());
    assert_eq!(engine.store.load("ab12").unwrap().status, JobStatus::Completed);
    assert_eq!(
        engine.store.read_result("ab12").unwrap(),
        "Error: Question timed out - no answer provided."
    );
}

#[test]
fn orphan_locks_are_removed() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine(&dir);
    engine.config.old_lock_age = Duration::ZERO;
    let lock_path = engine.store.layout().queue_dir().join("ab12.json.lock");
    std::fs::write(&lock_path, "").unwrap();

    reap_old(&engine);
    assert!(!lock_path.exists());
}
