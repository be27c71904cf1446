// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-target advisory file locks.
//!
//! Each lockable target gets a `<target>.lock` sibling holding an exclusive
//! flock. Acquisition is always non-blocking; contenders skip the target and
//! retry on a later scan. The lock file itself stays on disk after release
//! (orphans are reaped by the old-job cleanup).

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// An exclusive advisory lock on a sibling `.lock` file.
///
/// Released on drop. The OS drops the flock automatically if the holding
/// process dies, so a crashed runner never wedges the queue.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Path of the lock sidecar for `target` (`job.json` → `job.json.lock`).
    pub fn lock_path(target: &Path) -> PathBuf {
        let mut os = target.as_os_str().to_os_string();
        os.push(".lock");
        PathBuf::from(os)
    }

    /// Try to acquire the lock without blocking.
    ///
    /// Returns `Ok(None)` when another holder has it.
    pub fn try_acquire(target: &Path) -> io::Result<Option<FileLock>> {
        let path = Self::lock_path(target);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(FileLock { file, path })),
            Err(_) => Ok(None),
        }
    }

    /// Path of the underlying lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock errors (including an already-closed descriptor) are ignored;
        // the kernel releases the flock when the fd goes away regardless.
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
