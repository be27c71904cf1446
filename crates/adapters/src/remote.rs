// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming chat-completions backend for remote vendor models.
//!
//! Model ids carrying a vendor prefix bypass the CLI worker entirely and
//! stream over HTTPS instead. The caller formats each delta into a synthetic
//! assistant event line so the stream sidecar stays consumable by the same
//! UI path as CLI jobs. No session persistence, no question gating.

use crate::env;
use futures_util::StreamExt;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Vendor namespaces served by the remote backend instead of the CLI.
pub const REMOTE_MODEL_PREFIXES: &[&str] = &[
    "nvidia/",
    "meta/",
    "deepseek-ai/",
    "qwen/",
    "mistralai/",
    "microsoft/",
    "google/",
    "moonshotai/",
    "openai/",
];

/// Whether a model id selects the remote backend.
pub fn is_remote_model(model: &str) -> bool {
    REMOTE_MODEL_PREFIXES.iter().any(|p| model.starts_with(p))
}

/// Hard cap on a single remote request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from the remote backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("API key not configured for {0}")]
    MissingKey(&'static str),
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },
    #[error("API request timed out")]
    Timeout,
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Http(e)
        }
    }
}

/// Resolved API endpoint for one model id.
#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    pub base_url: String,
    pub api_key: String,
    pub model_id: String,
}

impl RemoteEndpoint {
    /// Resolve a prefixed model id to its endpoint and credentials.
    ///
    /// `openai/<model>` strips the prefix and talks to the OpenAI API; every
    /// other prefix keeps the full id and goes through the NIM-compatible
    /// endpoint from `NVIDIA_BASE_URL`.
    pub fn resolve(model: &str) -> Result<Self, RemoteError> {
        if let Some(rest) = model.strip_prefix("openai/") {
            let api_key = env::openai_api_key().ok_or(RemoteError::MissingKey("OpenAI"))?;
            Ok(Self {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key,
                model_id: rest.to_string(),
            })
        } else {
            let api_key = env::nvidia_api_key().ok_or(RemoteError::MissingKey("NVIDIA"))?;
            Ok(Self {
                base_url: env::nvidia_base_url(),
                api_key,
                model_id: model.to_string(),
            })
        }
    }
}

/// POST `/chat/completions` with `stream: true` and accumulate
/// `delta.content` chunks, invoking `on_delta` for each one.
///
/// Returns the full response text after `[DONE]` or connection close.
pub async fn stream_completion(
    endpoint: &RemoteEndpoint,
    message: &str,
    mut on_delta: impl FnMut(&str),
) -> Result<String, RemoteError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let payload = serde_json::json!({
        "model": endpoint.model_id,
        "messages": [{"role": "user", "content": message}],
        "stream": true,
        "max_tokens": 8192,
    });

    let response = client
        .post(format!("{}/chat/completions", endpoint.base_url))
        .bearer_auth(&endpoint.api_key)
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(RemoteError::Api {
            status,
            body: crate::agent::stream::clip(&body, 200).to_string(),
        });
    }

    let mut full = String::new();
    let mut buffer = String::new();
    let mut stream = response.bytes_stream();

    'outer: while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(RemoteError::from)?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buffer.find('\n') {
            let line: String = buffer.drain(..=pos).collect();
            let line = line.trim();
            let Some(data) = line.strip_prefix("data: ") else {
                continue;
            };
            if data == "[DONE]" {
                break 'outer;
            }
            let Ok(event) = serde_json::from_str::<Value>(data) else {
                continue;
            };
            let content = event
                .get("choices")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("delta"))
                .and_then(|d| d.get("content"))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if !content.is_empty() {
                full.push_str(content);
                on_delta(content);
            }
        }
    }

    Ok(full)
}

/// Format a response chunk as a synthetic assistant event line, matching the
/// CLI worker's stream-json shape.
pub fn synthetic_event_line(content: &str) -> String {
    serde_json::json!({
        "type": "assistant",
        "message": {"content": [{"type": "text", "text": content}]},
    })
    .to_string()
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
