// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine.

use relay_adapters::RemoteError;
use relay_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the runner.
///
/// Every variant that escapes a claimed job is converted into an
/// `Error: …` result file - producers never see a job stuck in
/// `processing` because of one.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("remote backend error: {0}")]
    Remote(#[from] RemoteError),
}
