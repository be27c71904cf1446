// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout of the per-user relay directories.
//!
//! The default user keeps the unsuffixed directory names for backwards
//! compatibility; every other user gets a `-<user>` suffix. This is a
//! deployment convention, not a logical namespace - all path computation
//! funnels through [`Layout`].

use std::io;
use std::path::{Path, PathBuf};

/// User whose directories carry no suffix.
pub const DEFAULT_USER: &str = "axion";

/// Queue-directory entries that are never treated as job files.
pub const RESERVED_FILES: &[&str] = &[
    "watcher.heartbeat",
    "relay_sessions.json",
    "AXION_OUTBOX.json",
];

/// Computes every path the dispatcher touches.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    user: String,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            user: user.into(),
        }
    }

    fn user_dir(&self, base: &str) -> PathBuf {
        if self.user == DEFAULT_USER {
            self.root.join(base)
        } else {
            self.root.join(format!("{base}-{}", self.user))
        }
    }

    pub fn queue_dir(&self) -> PathBuf {
        self.user_dir(".queue")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.user_dir(".history")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.user_dir(".temp")
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.user_dir(".screenshots")
    }

    pub fn job_path(&self, id: &str) -> PathBuf {
        self.queue_dir().join(format!("{id}.json"))
    }

    pub fn stream_path(&self, id: &str) -> PathBuf {
        self.queue_dir().join(format!("{id}.stream"))
    }

    pub fn result_path(&self, id: &str) -> PathBuf {
        self.queue_dir().join(format!("{id}.result"))
    }

    pub fn questions_path(&self, id: &str) -> PathBuf {
        self.queue_dir().join(format!("{id}.questions"))
    }

    /// Materialized attachment path (`<queue>/<id>_img<n>.<ext>`).
    pub fn image_path(&self, id: &str, index: usize, ext: &str) -> PathBuf {
        self.queue_dir().join(format!("{id}_img{index}.{ext}"))
    }

    pub fn heartbeat_path(&self) -> PathBuf {
        self.queue_dir().join("watcher.heartbeat")
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.queue_dir().join("relay_sessions.json")
    }

    pub fn pid_path(&self) -> PathBuf {
        self.queue_dir().join("watcher.pid")
    }

    pub fn log_path(&self) -> PathBuf {
        self.queue_dir().join("watcher.log")
    }

    /// Whether a queue-directory file name is reserved (never a job).
    pub fn is_reserved(name: &str) -> bool {
        RESERVED_FILES.contains(&name)
    }

    /// Create all per-user directories.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [
            self.queue_dir(),
            self.history_dir(),
            self.temp_dir(),
            self.screenshots_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
