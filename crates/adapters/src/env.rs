// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the relay system.
//!
//! Also loads auxiliary keys from a dotenv-style `.env` file at startup;
//! variables already present in the process environment win.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Which user's queue this instance serves (default: `axion`).
pub fn relay_user() -> String {
    std::env::var("RELAY_USER").unwrap_or_else(|_| "axion".to_string())
}

/// Root directory holding the per-user queue/history/temp trees.
pub fn relay_dir() -> PathBuf {
    std::env::var("RELAY_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// HTTP port of the external relay server. The core only logs it.
pub fn relay_port() -> u16 {
    std::env::var("RELAY_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(7786)
}

/// Base directory that project names resolve under.
pub fn projects_dir() -> PathBuf {
    std::env::var("RELAY_PROJECTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/opt/clawd/projects"))
}

/// Worker binary (override with `RELAY_CLAUDE_BIN`, e.g. a fake for tests).
pub fn claude_bin() -> String {
    std::env::var("RELAY_CLAUDE_BIN").unwrap_or_else(|_| "claude".to_string())
}

/// The worker's state directory holding per-project session artifacts.
pub fn claude_config_dir() -> PathBuf {
    std::env::var("CLAUDE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::home_dir().unwrap_or_default().join(".claude"))
}

pub fn nvidia_api_key() -> Option<String> {
    std::env::var("NVIDIA_API_KEY").ok().filter(|k| !k.is_empty())
}

pub fn nvidia_base_url() -> String {
    std::env::var("NVIDIA_BASE_URL")
        .unwrap_or_else(|_| "https://integrate.api.nvidia.com/v1".to_string())
}

pub fn openai_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
}

/// Load `<dir>/.env` into the process environment.
///
/// Missing file is fine; existing process variables are never overwritten.
pub fn load_dotenv(dir: &Path) {
    let path = dir.join(".env");
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read .env");
            return;
        }
    };
    for (key, value) in parse_env(&content) {
        if std::env::var_os(&key).is_none() {
            std::env::set_var(&key, &value);
        }
    }
}

/// Parse dotenv content into key-value pairs.
///
/// Comment and blank lines are skipped; a line without `=` is ignored. The
/// key is trimmed, the value is taken verbatim after the first `=`.
fn parse_env(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .filter_map(|(key, value)| {
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
