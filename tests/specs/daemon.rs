//! Daemon lifecycle and end-to-end job specs.

use crate::prelude::*;
use serial_test::serial;
use std::time::Duration;

#[test]
fn version_flag_prints_and_exits_zero() {
    let output = assert_cmd::Command::new(daemon_bin())
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("relayd"));
}

#[test]
fn unknown_argument_is_rejected() {
    let output = assert_cmd::Command::new(daemon_bin())
        .arg("--bogus")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
#[serial]
fn single_chat_job_happy_path() {
    let harness = Harness::new();
    let mut daemon = harness.spawn_daemon();

    harness.submit_job("abcd1234", "hello", "demo");

    assert!(
        wait_for(
            || harness.result_path("abcd1234").exists(),
            Duration::from_secs(20)
        ),
        "no result file appeared"
    );
    assert_eq!(
        std::fs::read_to_string(harness.result_path("abcd1234")).unwrap(),
        "hi there"
    );
    assert!(
        wait_for(
            || job_status(&harness.queue_dir(), "abcd1234").as_deref() == Some("completed"),
            Duration::from_secs(5)
        ),
        "job never reached completed"
    );
    // Stream sidecar is gone once the result exists.
    assert!(!harness.queue_dir().join("abcd1234.stream").exists());

    // History was appended server-side.
    let history_path = harness.dir.path().join(".history/demo.json");
    assert!(
        wait_for(|| history_path.exists(), Duration::from_secs(5)),
        "no history file written"
    );
    let history = std::fs::read_to_string(history_path).unwrap();
    assert!(history.contains("hi there"));

    assert_eq!(terminate_and_wait(&mut daemon), Some(0));
}

#[test]
#[serial]
fn second_instance_refuses_to_start() {
    let harness = Harness::new();
    let mut daemon = harness.spawn_daemon();

    // Wait for the first instance to take the PID lock.
    let pid_path = harness.queue_dir().join("watcher.pid");
    assert!(
        wait_for(|| pid_path.exists(), Duration::from_secs(10)),
        "first instance never wrote its PID file"
    );

    let output = assert_cmd::Command::new(daemon_bin())
        .env("RELAY_DIR", harness.dir.path())
        .env("RELAY_USER", "axion")
        .env("RELAY_CLAUDE_BIN", harness.worker_path())
        .timeout(Duration::from_secs(10))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("already running"));

    assert_eq!(terminate_and_wait(&mut daemon), Some(0));
}

#[test]
#[serial]
fn graceful_shutdown_exits_zero_when_idle() {
    let harness = Harness::new();
    let mut daemon = harness.spawn_daemon();

    let heartbeat = harness.queue_dir().join("watcher.heartbeat");
    assert!(
        wait_for(|| heartbeat.exists(), Duration::from_secs(10)),
        "no heartbeat written"
    );

    assert_eq!(terminate_and_wait(&mut daemon), Some(0));
}
