// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project mutual exclusion with a bounded pool.
//!
//! At most one job runs per project, and at most `max_parallel` projects run
//! at once. Size check and insert happen in a single critical section.

use parking_lot::Mutex;
use std::collections::HashSet;

/// In-memory set of projects with a running job.
pub struct ActiveProjects {
    max_parallel: usize,
    active: Mutex<HashSet<String>>,
}

impl ActiveProjects {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel,
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Claim a project slot. Returns false when the project already has a
    /// running job or the pool is full.
    pub fn try_mark_active(&self, project: &str) -> bool {
        let mut active = self.active.lock();
        if active.contains(project) {
            return false;
        }
        if active.len() >= self.max_parallel {
            return false;
        }
        active.insert(project.to_string());
        tracing::info!(project, total = active.len(), "project marked active");
        true
    }

    /// Release a project slot.
    pub fn mark_idle(&self, project: &str) {
        let mut active = self.active.lock();
        active.remove(project);
        tracing::info!(project, remaining = active.len(), "project marked idle");
    }

    /// Whether a project currently has a running job.
    pub fn is_busy(&self, project: &str) -> bool {
        self.active.lock().contains(project)
    }

    /// Number of currently-active projects.
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
