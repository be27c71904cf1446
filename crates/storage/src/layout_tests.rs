// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_user_keeps_unsuffixed_names() {
    let layout = Layout::new("/srv/relay", DEFAULT_USER);
    assert_eq!(layout.queue_dir(), std::path::PathBuf::from("/srv/relay/.queue"));
    assert_eq!(layout.history_dir(), std::path::PathBuf::from("/srv/relay/.history"));
}

#[test]
fn other_users_get_suffix() {
    let layout = Layout::new("/srv/relay", "xfg6gb");
    assert_eq!(
        layout.queue_dir(),
        std::path::PathBuf::from("/srv/relay/.queue-xfg6gb")
    );
    assert_eq!(
        layout.screenshots_dir(),
        std::path::PathBuf::from("/srv/relay/.screenshots-xfg6gb")
    );
}

#[test]
fn sidecar_paths_share_the_job_stem() {
    let layout = Layout::new("/srv/relay", DEFAULT_USER);
    assert!(layout.job_path("ab12").ends_with(".queue/ab12.json"));
    assert!(layout.stream_path("ab12").ends_with(".queue/ab12.stream"));
    assert!(layout.result_path("ab12").ends_with(".queue/ab12.result"));
    assert!(layout.questions_path("ab12").ends_with(".queue/ab12.questions"));
    assert!(layout.image_path("ab12", 0, "png").ends_with(".queue/ab12_img0.png"));
}

#[yare::parameterized(
    heartbeat = { "watcher.heartbeat", true },
    sessions  = { "relay_sessions.json", true },
    outbox    = { "AXION_OUTBOX.json", true },
    job       = { "abcd1234.json", false },
)]
fn reserved_names(name: &str, reserved: bool) {
    assert_eq!(Layout::is_reserved(name), reserved);
}

#[test]
fn ensure_dirs_creates_all() {
    let dir = tempfile::TempDir::new().unwrap();
    let layout = Layout::new(dir.path(), "tester");
    layout.ensure_dirs().unwrap();
    assert!(layout.queue_dir().is_dir());
    assert!(layout.history_dir().is_dir());
    assert!(layout.temp_dir().is_dir());
    assert!(layout.screenshots_dir().is_dir());
}
