// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-project chat history with a size cap.

use crate::atomic::{read_json, write_json_atomic, StorageError};
use relay_core::{epoch_secs, DEFAULT_PROJECT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum entries kept per project; oldest are dropped first.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// One chat exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub assistant: String,
    pub timestamp: f64,
}

/// Per-project history file (`<project>.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub entries: Vec<HistoryEntry>,
}

/// Reads and appends project history files.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, project: &str) -> PathBuf {
        self.dir.join(format!("{project}.json"))
    }

    /// Load a project's history; missing files are empty history.
    pub fn load(&self, project: &str) -> History {
        read_json(&self.path(project)).unwrap_or_default()
    }

    /// Append one exchange.
    ///
    /// Skips the sentinel project. If the most recent entry carries the same
    /// user text, the assistant text is updated in place when the new one is
    /// longer (re-runs refine, they never duplicate). The file is truncated
    /// to the newest [`MAX_HISTORY_ENTRIES`].
    pub fn append(&self, project: &str, user: &str, assistant: &str) -> Result<(), StorageError> {
        if project.is_empty() || project == DEFAULT_PROJECT {
            return Ok(());
        }

        let mut history = self.load(project);
        match history.entries.last_mut() {
            Some(last) if last.user == user => {
                if assistant.len() > last.assistant.len() {
                    last.assistant = assistant.to_string();
                    last.timestamp = epoch_secs();
                }
            }
            _ => {
                history.entries.push(HistoryEntry {
                    user: user.to_string(),
                    assistant: assistant.to_string(),
                    timestamp: epoch_secs(),
                });
            }
        }

        let len = history.entries.len();
        if len > MAX_HISTORY_ENTRIES {
            history.entries.drain(..len - MAX_HISTORY_ENTRIES);
        }

        write_json_atomic(&self.path(project), &history)?;
        tracing::info!(project, "saved history entry");
        Ok(())
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
