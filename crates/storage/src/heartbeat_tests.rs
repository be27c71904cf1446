// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

#[test]
fn write_produces_valid_heartbeat() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watcher.heartbeat");
    let writer = HeartbeatWriter::new(&path);
    writer.write(Some("ab12"), Some("Reading file main.rs"));

    let beat: Heartbeat =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(beat.pid, std::process::id());
    assert_eq!(beat.jobs_processed, 0);
    assert_eq!(beat.current_job.as_deref(), Some("ab12"));
    assert_eq!(beat.activity.as_deref(), Some("Reading file main.rs"));
    assert!(beat.timestamp > 0.0);
}

#[test]
fn counter_increments_show_up() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watcher.heartbeat");
    let writer = HeartbeatWriter::new(&path);
    assert_eq!(writer.increment_jobs(), 1);
    assert_eq!(writer.increment_jobs(), 2);
    writer.write(None, Some("Idle - waiting for jobs"));

    let beat: Heartbeat =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(beat.jobs_processed, 2);
    assert!(beat.current_job.is_none());
}

#[test]
fn write_to_unwritable_path_does_not_panic() {
    let writer = HeartbeatWriter::new("/nonexistent-relay-dir/watcher.heartbeat");
    writer.write(None, None);
}
