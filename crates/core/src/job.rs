// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and status state machine.
//!
//! A job is one JSON file in the queue directory. Producers create it with
//! status `pending`; exactly one runner moves it through `processing` and
//! (optionally) `waiting_for_answers` to a terminal state. Sidecar files
//! (`.stream`, `.result`, `.questions`, `.json.lock`) share the job id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel project used when a job carries an empty `project` field.
pub const DEFAULT_PROJECT: &str = "default";

/// Status of a job through its lifecycle.
///
/// Legal motion: `pending → processing → {waiting_for_answers → pending →
/// processing}* → {completed, error}`. `answers_provided` is a legacy alias
/// producers may still write after answering questions; it is dispatched
/// exactly like `pending` but never emitted by this codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    WaitingForAnswers,
    AnswersProvided,
    Completed,
    Error,
}

impl JobStatus {
    /// Whether the supervisor may claim a job in this status.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::AnswersProvided)
    }

    /// Whether the status is terminal (never rewritten to a non-terminal one).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::WaitingForAnswers => write!(f, "waiting_for_answers"),
            JobStatus::AnswersProvided => write!(f, "answers_provided"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Kind of job, controlling session policy, pausing, and history.
///
/// Unknown strings deserialize as `Chat` so producers can introduce new kinds
/// without stranding jobs in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobType {
    #[default]
    Chat,
    Format,
    Explain,
    Qa,
    Modify,
}

impl JobType {
    /// Format jobs always run in a fresh single-turn session.
    pub fn is_format(&self) -> bool {
        matches!(self, JobType::Format)
    }

    /// Whether the runner may pause the job on detected questions.
    pub fn allows_pausing(&self) -> bool {
        !matches!(self, JobType::Qa | JobType::Explain | JobType::Format)
    }

    /// Whether a completed job of this type is appended to project history.
    pub fn records_history(&self) -> bool {
        !matches!(self, JobType::Format)
    }
}

impl From<String> for JobType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "format" => JobType::Format,
            "explain" => JobType::Explain,
            "qa" => JobType::Qa,
            "modify" => JobType::Modify,
            _ => JobType::Chat,
        }
    }
}

impl From<JobType> for String {
    fn from(t: JobType) -> Self {
        match t {
            JobType::Chat => "chat",
            JobType::Format => "format",
            JobType::Explain => "explain",
            JobType::Qa => "qa",
            JobType::Modify => "modify",
        }
        .to_string()
    }
}

/// Inline image attachment, materialized to a temp file before the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// Base64 payload, optionally prefixed `data:<mime>;base64,`.
    #[serde(default)]
    pub data: String,
    /// MIME type, e.g. `image/png`.
    #[serde(rename = "type", default)]
    pub mime: String,
}

/// One job file in the queue directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub project: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageAttachment>,
    #[serde(default)]
    pub created: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
    /// Last human-readable status string from the event-stream parser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    /// Accumulated answers from previous question pauses, appended to the
    /// next prompt.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context_answers: String,
    #[serde(default)]
    pub job_type: JobType,
    /// Final response mirrored into the record by the remote backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Diagnostic for `status = error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Opaque producer field, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
}

fn default_model() -> String {
    "opus".to_string()
}

impl JobRecord {
    /// Project key used for serialization buckets; empty normalizes to
    /// [`DEFAULT_PROJECT`].
    pub fn project_key(&self) -> &str {
        if self.project.is_empty() {
            DEFAULT_PROJECT
        } else {
            &self.project
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
