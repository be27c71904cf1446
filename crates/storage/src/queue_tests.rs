// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::{JobStatus, JobType};
use tempfile::TempDir;

fn store() -> (TempDir, JobStore) {
    let dir = TempDir::new().unwrap();
    let layout = Layout::new(dir.path(), crate::DEFAULT_USER);
    layout.ensure_dirs().unwrap();
    (dir, JobStore::new(layout))
}

fn job(id: &str) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        status: JobStatus::Pending,
        message: "hello".to_string(),
        model: "sonnet".to_string(),
        project: "demo".to_string(),
        images: Vec::new(),
        created: 1000.0,
        started_at: None,
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
fn save_and_load_roundtrip() {
    let (_dir, store) = store();
    store.save(&job("ab12")).unwrap();
    let loaded = store.load("ab12").unwrap();
    assert_eq!(loaded.id, "ab12");
    assert_eq!(loaded.status, JobStatus::Pending);
}

#[test]
fn load_missing_is_none() {
    let (_dir, store) = store();
    assert!(store.load("nope").is_none());
}

#[test]
fn scan_skips_reserved_files() {
    let (_dir, store) = store();
    store.save(&job("ab12")).unwrap();
    let queue = store.layout().queue_dir();
    std::fs::write(queue.join("relay_sessions.json"), "{}").unwrap();
    std::fs::write(queue.join("AXION_OUTBOX.json"), "{}").unwrap();
    std::fs::write(queue.join("notes.txt"), "not a job").unwrap();

    let found = store.scan();
    assert_eq!(found.len(), 1);
    assert!(found[0].ends_with("ab12.json"));
}

#[test]
fn result_and_stream_sidecars() {
    let (_dir, store) = store();
    store.write_stream("ab12", "partial output").unwrap();
    store.write_result("ab12", "final text").unwrap();
    assert!(store.result_exists("ab12"));
    assert_eq!(store.read_result("ab12").unwrap(), "final text");
    store.delete_stream("ab12");
    assert!(!store.layout().stream_path("ab12").exists());
}

#[test]
fn remove_job_files_clears_everything() {
    let (_dir, store) = store();
    store.save(&job("ab12")).unwrap();
    store.write_stream("ab12", "s").unwrap();
    store.write_result("ab12", "r").unwrap();
    let _lock = store.try_lock("ab12").unwrap().unwrap();
    drop(_lock);

    store.remove_job_files("ab12");
    let queue = store.layout().queue_dir();
    assert!(std::fs::read_dir(queue).unwrap().next().is_none());
}

#[test]
fn cleanup_images_removes_only_that_job() {
    let (_dir, store) = store();
    let queue = store.layout().queue_dir();
    std::fs::write(queue.join("ab12_img0.png"), b"x").unwrap();
    std::fs::write(queue.join("ab12_img1.jpg"), b"x").unwrap();
    std::fs::write(queue.join("cd34_img0.png"), b"x").unwrap();

    store.cleanup_images("ab12");
    assert!(!queue.join("ab12_img0.png").exists());
    assert!(!queue.join("ab12_img1.jpg").exists());
    assert!(queue.join("cd34_img0.png").exists());
}

#[test]
fn partially_written_job_file_reads_as_none() {
    let (_dir, store) = store();
    // A reader racing a non-atomic writer sees a JSON prefix; that must be
    // indistinguishable from the file being absent.
    std::fs::write(
        store.layout().job_path("ab12"),
        r#"{"id":"ab12","status":"pen"#,
    )
    .unwrap();
    assert!(store.load("ab12").is_none());
    assert!(JobStore::load_path(&store.layout().job_path("ab12")).is_none());
}

#[test]
fn locked_job_blocks_second_lock() {
    let (_dir, store) = store();
    store.save(&job("ab12")).unwrap();
    let held = store.try_lock("ab12").unwrap();
    assert!(held.is_some());
    assert!(store.try_lock("ab12").unwrap().is_none());
}
