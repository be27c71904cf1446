// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent per-project conversation sessions.
//!
//! Consecutive jobs in the same project resume the same worker conversation.
//! The table lives in `relay_sessions.json`; a saved id is only trusted while
//! the worker's on-disk session artifact (`<claude_dir>/projects/<encoded>/
//! <id>.jsonl`) still exists. A small TTL cache cuts file reads on busy
//! queues.

use crate::atomic::{read_json, write_json_atomic};
use parking_lot::Mutex;
use relay_core::{IdGen, ShortId, UuidIdGen};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default lifetime of the in-memory session cache.
pub const SESSION_CACHE_TTL: Duration = Duration::from_secs(30);

struct Cache {
    entries: HashMap<String, String>,
    loaded_at: Option<Instant>,
}

/// Project → session-id registry with TTL cache.
pub struct SessionRegistry {
    path: PathBuf,
    claude_dir: PathBuf,
    ttl: Duration,
    cache: Mutex<Cache>,
}

impl SessionRegistry {
    /// `path` is the sessions table; `claude_dir` is the worker's state root
    /// (normally `~/.claude`).
    pub fn new(path: impl Into<PathBuf>, claude_dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(path, claude_dir, SESSION_CACHE_TTL)
    }

    pub fn with_ttl(
        path: impl Into<PathBuf>,
        claude_dir: impl Into<PathBuf>,
        ttl: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            claude_dir: claude_dir.into(),
            ttl,
            cache: Mutex::new(Cache {
                entries: HashMap::new(),
                loaded_at: None,
            }),
        }
    }

    /// Get the session id for a project, minting one if absent or stale.
    ///
    /// Returns `(id, is_new)`: `is_new` tells the runner to start the worker
    /// in new-session mode rather than resume mode. The returned id is either
    /// freshly minted or verified present on disk at this moment.
    pub fn get_or_create(&self, project: &str, project_dir: Option<&Path>) -> (String, bool) {
        let mut cache = self.cache.lock();

        let fresh = cache
            .loaded_at
            .is_some_and(|at| at.elapsed() <= self.ttl);
        if fresh {
            if let Some(id) = cache.entries.get(project) {
                if self.artifact_exists(project_dir, id) {
                    tracing::debug!(project, session = id.short(8), "using cached session");
                    return (id.clone(), false);
                }
            }
        }

        // Cache miss or stale - reload the table from disk.
        let mut sessions: HashMap<String, String> = read_json(&self.path).unwrap_or_default();
        cache.entries = sessions.clone();
        cache.loaded_at = Some(Instant::now());

        if let Some(id) = sessions.get(project).cloned() {
            if self.artifact_exists(project_dir, &id) {
                tracing::info!(project, session = id.short(8), "resuming session");
                return (id, false);
            }
            tracing::info!(
                project,
                session = id.short(8),
                "session artifact gone, minting a new session"
            );
        }

        let new_id = UuidIdGen.next();
        sessions.insert(project.to_string(), new_id.clone());
        if let Err(e) = write_json_atomic(&self.path, &sessions) {
            tracing::error!(project, error = %e, "failed to persist session table");
        }
        cache.entries = sessions;
        tracing::info!(project, session = new_id.short(8), "created session");
        (new_id, true)
    }

    /// A saved id is valid iff the worker's session artifact exists. Without
    /// a resolved project directory there is nothing to check against, so the
    /// saved id is trusted as-is.
    fn artifact_exists(&self, project_dir: Option<&Path>, session_id: &str) -> bool {
        let Some(dir) = project_dir else {
            return true;
        };
        self.claude_dir
            .join("projects")
            .join(project_dir_name(dir))
            .join(format!("{session_id}.jsonl"))
            .exists()
    }
}

/// Convert a project path to the worker's directory-name encoding.
///
/// Canonicalizes to resolve symlinks (the worker does this internally, so we
/// must match to find the right artifact directory), then maps `/` and `.`
/// to `-`.
pub fn project_dir_name(path: &Path) -> String {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    canonical.to_string_lossy().replace(['/', '.'], "-")
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
