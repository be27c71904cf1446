// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: the worker CLI, its PTY, and remote chat APIs.

pub mod agent;
pub mod env;
pub mod remote;

pub use agent::command::{build_worker_invocation, model_id, SessionMode, WorkerInvocation};
pub use agent::pty::{kill_group, shutdown_group, spawn_worker_pty, terminate_group, PtyChild};
pub use agent::sanitize::{detect_auth_error, strip_control_sequences};
pub use agent::stream::{parse_stream, StreamUpdate};
pub use remote::{is_remote_model, stream_completion, RemoteEndpoint, RemoteError};
