// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker CLI invocation construction.

use crate::env;

/// How the worker should attach to a conversation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    /// First use of this session id: `--session-id <id>`.
    New(String),
    /// Session artifact exists: `--resume <id>`.
    Resume(String),
}

/// A fully-assembled worker command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInvocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Map a logical model tag to the concrete worker model id.
pub fn model_id(tag: &str) -> &'static str {
    match tag {
        "opus" | "claude" => "claude-opus-4-6",
        "sonnet" => "claude-sonnet-4-5-20250929",
        "haiku" => "claude-haiku-4-5-20251001",
        _ => "claude-sonnet-4-20250514",
    }
}

/// Build the worker argv: skip permission prompts, select the model, request
/// line-delimited JSON output, attach the session, and pass the prompt.
pub fn build_worker_invocation(
    model_tag: &str,
    session: &SessionMode,
    max_turns: Option<u32>,
    prompt: &str,
) -> WorkerInvocation {
    let mut args = vec![
        "--dangerously-skip-permissions".to_string(),
        "--model".to_string(),
        model_id(model_tag).to_string(),
        // --verbose is required for stream-json output
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--verbose".to_string(),
    ];

    match session {
        SessionMode::New(id) => {
            args.push("--session-id".to_string());
            args.push(id.clone());
        }
        SessionMode::Resume(id) => {
            args.push("--resume".to_string());
            args.push(id.clone());
        }
    }

    if let Some(turns) = max_turns {
        args.push("--max-turns".to_string());
        args.push(turns.to_string());
    }

    args.push("-p".to_string());
    args.push(prompt.to_string());

    WorkerInvocation {
        program: env::claude_bin(),
        args,
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
