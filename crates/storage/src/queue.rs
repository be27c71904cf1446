// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job store: the queue directory as seen by the supervisor and runners.

use crate::atomic::{read_json, write_json_atomic, write_text_atomic, StorageError};
use crate::layout::Layout;
use crate::lock::FileLock;
use relay_core::{JobRecord, QuestionsFile};
use std::fs;
use std::path::{Path, PathBuf};

/// Reads and writes job records and their sidecars.
#[derive(Debug, Clone)]
pub struct JobStore {
    layout: Layout,
}

impl JobStore {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Load a job record; absence and corruption both yield `None`.
    pub fn load(&self, id: &str) -> Option<JobRecord> {
        read_json(&self.layout.job_path(id))
    }

    /// Load a job record from an explicit path (used by the scanner).
    pub fn load_path(path: &Path) -> Option<JobRecord> {
        read_json(path)
    }

    /// Persist a job record atomically.
    pub fn save(&self, job: &JobRecord) -> Result<(), StorageError> {
        write_json_atomic(&self.layout.job_path(&job.id), job)
    }

    /// Candidate job files: `*.json` in the queue directory, reserved names
    /// excluded. Order is directory order, not a scheduling guarantee.
    pub fn scan(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.layout.queue_dir()) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|x| x == "json"))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !Layout::is_reserved(n))
            })
            .collect()
    }

    /// Try to lock a job file without blocking.
    pub fn try_lock(&self, id: &str) -> std::io::Result<Option<FileLock>> {
        FileLock::try_acquire(&self.layout.job_path(id))
    }

    pub fn write_result(&self, id: &str, text: &str) -> Result<(), StorageError> {
        write_text_atomic(&self.layout.result_path(id), text)
    }

    pub fn read_result(&self, id: &str) -> Option<String> {
        fs::read_to_string(self.layout.result_path(id)).ok()
    }

    pub fn result_exists(&self, id: &str) -> bool {
        self.layout.result_path(id).exists()
    }

    /// Overwrite the live output snapshot for UI polling.
    pub fn write_stream(&self, id: &str, text: &str) -> Result<(), StorageError> {
        write_text_atomic(&self.layout.stream_path(id), text)
    }

    pub fn delete_stream(&self, id: &str) {
        let _ = fs::remove_file(self.layout.stream_path(id));
    }

    pub fn write_questions(&self, questions: &QuestionsFile) -> Result<(), StorageError> {
        write_json_atomic(&self.layout.questions_path(&questions.job_id), questions)
    }

    pub fn delete_questions(&self, id: &str) {
        let _ = fs::remove_file(self.layout.questions_path(id));
    }

    /// Remove the job file and every sidecar. Order does not matter.
    pub fn remove_job_files(&self, id: &str) {
        for path in [
            self.layout.job_path(id),
            self.layout.result_path(id),
            self.layout.stream_path(id),
            self.layout.questions_path(id),
            FileLock::lock_path(&self.layout.job_path(id)),
        ] {
            let _ = fs::remove_file(path);
        }
    }

    /// Remove materialized attachment files for a job.
    pub fn cleanup_images(&self, id: &str) {
        let prefix = format!("{id}_img");
        let Ok(entries) = fs::read_dir(self.layout.queue_dir()) else {
            return;
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            if name.to_str().is_some_and(|n| n.starts_with(&prefix)) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    tracing::warn!(path = %entry.path().display(), error = %e, "failed to remove attachment");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
