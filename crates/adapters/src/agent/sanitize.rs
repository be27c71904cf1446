// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output normalization and failure-signature scanning.

use regex::Regex;
use std::sync::LazyLock;

// Allow expect here as the regexes are compile-time verified to be valid
#[allow(clippy::expect_used)]
static CSI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static OSC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\][^\x07]*\x07").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static BARE_ESC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b.").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static CONTROL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").expect("constant regex pattern is valid")
});

/// Strip terminal escape sequences and non-printable characters (newlines
/// and tabs survive), then trim surrounding whitespace.
pub fn strip_control_sequences(text: &str) -> String {
    let text = CSI.replace_all(text, "");
    let text = OSC.replace_all(&text, "");
    let text = BARE_ESC.replace_all(&text, "");
    let text = CONTROL.replace_all(&text, "");
    text.trim().to_string()
}

/// Signatures of authentication / key / quota failures in raw worker output.
const AUTH_PATTERNS: &[&str] = &[
    "invalid_api_key",
    "authentication_error",
    "Invalid API key",
    "unauthorized",
    "401",
    "api_key",
    "expired",
    "Could not resolve API key",
    "ANTHROPIC_API_KEY",
    "overloaded_error",
    "rate_limit",
];

/// Scan raw output for an auth/key failure and build the user-visible
/// diagnostic (matched signature plus the first 500 chars of raw output).
pub fn detect_auth_error(raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    let pattern = AUTH_PATTERNS
        .iter()
        .find(|p| lower.contains(&p.to_lowercase()))?;
    Some(format!(
        "Error: Claude API key issue detected ({pattern}). Please check/reset your API key and try again.\n\nRaw output: {}",
        super::stream::clip(raw, 500)
    ))
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
