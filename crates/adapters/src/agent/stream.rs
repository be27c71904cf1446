// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-delimited event-stream parser for worker output.
//!
//! The worker emits one JSON object per line. This parser is a pure function
//! over the bytes received so far: re-running it on a longer prefix may
//! change the activity string but only ever extends the accumulated text.
//! Unknown event shapes and unparsable lines (including a partial trailing
//! line) advance the stream without effect.

use serde_json::Value;
use std::path::Path;

/// Derived view of a worker output prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUpdate {
    /// Short human-readable description of what the worker is doing.
    pub activity: String,
    /// Response text accumulated from assistant `text` blocks (or, if none
    /// arrived, the final `result` event).
    pub text: String,
}

struct SubAgent {
    desc: String,
}

/// Parse the raw output received so far into `(activity, text)`.
pub fn parse_stream(raw: &str) -> StreamUpdate {
    let mut activity = "Thinking...".to_string();
    let mut text_parts: Vec<String> = Vec::new();
    let mut result_text: Option<String> = None;
    let mut agents: Vec<SubAgent> = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(event) = serde_json::from_str::<Value>(trimmed) else {
            continue;
        };

        match event.get("type").and_then(|v| v.as_str()) {
            Some("assistant") => {
                let Some(content) = event
                    .get("message")
                    .and_then(|m| m.get("content"))
                    .and_then(|c| c.as_array())
                else {
                    continue;
                };
                for item in content {
                    match item.get("type").and_then(|v| v.as_str()) {
                        Some("tool_use") => {
                            activity = tool_activity(item, &mut agents);
                        }
                        Some("text") => {
                            if let Some(text) = item.get("text").and_then(|v| v.as_str()) {
                                text_parts.push(text.to_string());
                            }
                        }
                        _ => {}
                    }
                }
            }
            // Tool results do not change the activity.
            Some("user") => {}
            Some("result") => {
                activity = "Complete".to_string();
                if let Some(text) = event.get("result").and_then(|v| v.as_str()) {
                    result_text = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    if agents.len() > 1 {
        if let Some(last) = agents.last() {
            activity = format!("{} agents working: {}", agents.len(), clip(&last.desc, 30));
        }
    }

    let text = if text_parts.is_empty() {
        result_text.unwrap_or_default().to_string()
    } else {
        text_parts.concat()
    };

    StreamUpdate { activity, text }
}

/// Derive an activity phrase from a `tool_use` content item.
fn tool_activity(item: &Value, agents: &mut Vec<SubAgent>) -> String {
    let name = item.get("name").and_then(|v| v.as_str()).unwrap_or("unknown");
    let input = item.get("input").cloned().unwrap_or(Value::Null);
    let get = |key: &str| input.get(key).and_then(|v| v.as_str()).unwrap_or("");

    match name {
        "Read" => format!("Reading file {}", file_basename(&input, "file_path")),
        "Edit" => format!("Editing file {}", file_basename(&input, "file_path")),
        "Write" => format!("Creating file {}", file_basename(&input, "file_path")),
        "Bash" => bash_activity(get("command"), get("description")),
        "Grep" => {
            let pattern = clip(get("pattern"), 40);
            let path = get("path");
            if path.is_empty() {
                format!("Searching codebase for '{pattern}'")
            } else {
                format!("Searching for '{pattern}' in {}", basename(path))
            }
        }
        "Glob" => format!("Finding files matching {}", clip(get("pattern"), 40)),
        "Task" => {
            let id = item
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .chars()
                .take(8)
                .collect::<String>();
            let desc = get("description");
            let prompt = get("prompt");
            let agent_desc = match get("subagent_type") {
                "Explore" => format!("Explorer agent ({id})"),
                "Plan" => format!("Planning agent ({id})"),
                "general-purpose" => format!("Research agent ({id})"),
                _ => format!("Agent {id}"),
            };
            agents.push(SubAgent {
                desc: if desc.is_empty() { "working".to_string() } else { desc.to_string() },
            });
            if !desc.is_empty() {
                format!("{agent_desc}: {desc}")
            } else if !prompt.is_empty() {
                let first_line = prompt.lines().next().unwrap_or_default();
                format!("{agent_desc}: {}", clip(first_line, 60))
            } else {
                format!("Starting {agent_desc}")
            }
        }
        "TodoWrite" => "Updating task checklist".to_string(),
        "WebFetch" => {
            let url = get("url");
            if url.is_empty() {
                "Fetching web page".to_string()
            } else {
                let domain = url
                    .rsplit("//")
                    .next()
                    .unwrap_or(url)
                    .split('/')
                    .next()
                    .unwrap_or(url);
                format!("Fetching content from {}", clip(domain, 30))
            }
        }
        "WebSearch" => format!("Searching the web for '{}'", clip(get("query"), 40)),
        "AskUserQuestion" => "Waiting for your response".to_string(),
        "EnterPlanMode" => "Entering planning mode".to_string(),
        "ExitPlanMode" => "Plan ready for review".to_string(),
        other => format!("Using {other}"),
    }
}

/// Shell commands are summarized from their description when present,
/// with special-casing for the common tool prefixes.
fn bash_activity(command: &str, description: &str) -> String {
    if !description.is_empty() {
        return clip(description, 60).to_string();
    }
    let mut words = command.split_whitespace();
    let first = words.next().unwrap_or("");
    let second = words.next();
    if first == "git" {
        format!("Running git {}", second.unwrap_or("command"))
    } else if first == "npm" || first == "yarn" {
        format!("Running {first} {}", second.unwrap_or_default())
    } else if first.starts_with("python") || first.starts_with("node") {
        "Executing script".to_string()
    } else {
        format!("Running: {}", clip(command, 50))
    }
}

/// Basename of the path under `key`, or the placeholder `file` when the key
/// is absent entirely. A present-but-empty path yields an empty name.
fn file_basename(input: &Value, key: &str) -> String {
    match input.get(key).and_then(|v| v.as_str()) {
        Some(path) => basename(path),
        None => "file".to_string(),
    }
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Truncate to at most `max` bytes on a char boundary.
pub(crate) fn clip(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
