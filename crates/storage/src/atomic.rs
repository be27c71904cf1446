// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic write-and-rename primitives for shared JSON files.
//!
//! Readers must never observe a truncated file: writers stage the full
//! content in a sibling temp file and rename it onto the target. Readers
//! treat a missing file and a corrupt file identically.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sibling temp path for staging writes (`foo.json` → `foo.json.tmp`).
fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Serialize `value` as JSON and atomically replace `path`.
///
/// On failure the temp file is removed and the previous contents of `path`
/// are untouched.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let data = serde_json::to_vec(value)?;
    write_bytes_atomic(path, &data)
}

/// Atomically replace `path` with UTF-8 text.
pub fn write_text_atomic(path: &Path, text: &str) -> Result<(), StorageError> {
    write_bytes_atomic(path, text.as_bytes())
}

fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let tmp = temp_path(path);
    let result = (|| -> Result<(), StorageError> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Read and deserialize a JSON file.
///
/// Returns `None` when the file is absent or unparsable; callers supply
/// their own default in both cases.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "unparsable JSON file");
            None
        }
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
