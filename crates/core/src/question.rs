// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive-question detection over the worker's final text.
//!
//! Three patterns are tried in order; the first match wins:
//! 1. explicit `[[ASK]] … [[/ASK]]` blocks,
//! 2. an option-prompt phrase followed by ≥2 numbered lines,
//! 3. embedded `**Q<n>:**` blocks.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Kind of question presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Open,
    Choice,
}

/// One selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub key: String,
    pub text: String,
}

/// A structured question extracted from worker output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuestionOption>>,
}

/// Contents of a `<id>.questions` sidecar while a job is paused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsFile {
    pub job_id: String,
    pub questions: Vec<Question>,
    pub response_so_far: String,
    pub waiting: bool,
}

// Allow expect here as the regexes are compile-time verified to be valid
#[allow(clippy::expect_used)]
static ASK_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\[\[ASK\]\](.*?)\[\[/ASK\]\]")
        .dot_matches_new_line(true)
        .build()
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)^[ \t]*(\d+|[a-z])[.):][ \t]*")
        .case_insensitive(true)
        .build()
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static OPTION_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(
        r"which (?:option|approach|one|would you)|would you (?:like|prefer)|please (?:choose|select|pick)|what (?:would you|do you) (?:prefer|like|want)|do you want me to|should i|let me know (?:which|if|what)",
    )
    .case_insensitive(true)
    .build()
    .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static NUMBERED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)^[ \t]*(?:Option[ \t]*)?(\d+)[.):][ \t]*")
        .case_insensitive(true)
        .build()
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static Q_BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*Q(\d+):\*\*[ \t]*").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static Q_BLOCK_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*(?:Q\d+:|Answer:)").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static SUB_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-•][ \t]*\(([a-z])\)[ \t]*").expect("constant regex pattern is valid")
});

/// Scan worker text for interactive questions.
///
/// Returns the detected questions and whether the runner should pause the job
/// (`should_wait`). The caller still gates pausing on the job type.
pub fn detect_questions(text: &str) -> (Vec<Question>, bool) {
    if let Some(found) = detect_ask_blocks(text) {
        return (found, true);
    }
    if let Some(found) = detect_option_prompt(text) {
        return (found, true);
    }
    if let Some(found) = detect_q_blocks(text) {
        return (found, true);
    }
    (Vec::new(), false)
}

/// Pattern 0: explicit `[[ASK]]…[[/ASK]]` markers.
fn detect_ask_blocks(text: &str) -> Option<Vec<Question>> {
    let mut questions = Vec::new();
    for (i, cap) in ASK_BLOCK.captures_iter(text).enumerate() {
        let content = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        // Options inside an explicit block run to the next marker, blank
        // lines included.
        let options = sliced_options(&OPTION_LINE, content, None, false);
        let id = format!("Q{}", i + 1);
        if options.len() >= 2 {
            questions.push(Question {
                id,
                text: content.trim().to_string(),
                kind: QuestionKind::Choice,
                options: Some(options),
            });
        } else {
            questions.push(Question {
                id,
                text: content.trim().to_string(),
                kind: QuestionKind::Open,
                options: None,
            });
        }
    }
    if questions.is_empty() {
        None
    } else {
        Some(questions)
    }
}

/// Pattern 1: an option-prompt phrase plus ≥2 numbered lines.
fn detect_option_prompt(text: &str) -> Option<Vec<Question>> {
    if !OPTION_PROMPT.is_match(text) {
        return None;
    }
    let mut options = sliced_options(&NUMBERED_LINE, text, Some(200), true);
    if options.len() < 2 {
        return None;
    }
    options.truncate(6);
    Some(vec![Question {
        id: "Q1".to_string(),
        text: "Please select an option:".to_string(),
        kind: QuestionKind::Choice,
        options: Some(options),
    }])
}

/// Pattern 2: embedded `**Q<n>:**` blocks, optionally with `(a) …` sub-options.
fn detect_q_blocks(text: &str) -> Option<Vec<Question>> {
    let starts: Vec<_> = Q_BLOCK_START.captures_iter(text).collect();
    if starts.is_empty() {
        return None;
    }

    let mut questions = Vec::new();
    for cap in &starts {
        let whole = cap.get(0)?;
        let num = cap.get(1).map(|m| m.as_str()).unwrap_or("1");
        // Block runs until the next **Qn:** / **Answer:** marker or end of text.
        let rest = &text[whole.end()..];
        let end = Q_BLOCK_BOUNDARY.find(rest).map(|m| m.start()).unwrap_or(rest.len());
        let content = rest[..end].trim();

        let sub_options = sliced_options(&SUB_OPTION, content, None, true);
        if sub_options.is_empty() {
            questions.push(Question {
                id: format!("Q{num}"),
                text: content.to_string(),
                kind: QuestionKind::Open,
                options: None,
            });
        } else {
            questions.push(Question {
                id: format!("Q{num}"),
                text: content.to_string(),
                kind: QuestionKind::Choice,
                options: Some(sub_options),
            });
        }
    }
    Some(questions)
}

/// Extract `{key, text}` options by slicing the text between successive
/// matches of `starts` (the `regex` crate has no look-ahead, so boundaries
/// are computed from match positions instead). With `stop_at_blank`, option
/// text additionally ends at the first blank line.
fn sliced_options(
    starts: &Regex,
    text: &str,
    max_len: Option<usize>,
    stop_at_blank: bool,
) -> Vec<QuestionOption> {
    let matches: Vec<_> = starts.captures_iter(text).collect();
    let mut options = Vec::new();
    for (i, cap) in matches.iter().enumerate() {
        let Some(whole) = cap.get(0) else { continue };
        let key = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        let end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let mut body = &text[whole.end()..end];
        if stop_at_blank {
            if let Some(pos) = body.find("\n\n") {
                body = &body[..pos];
            }
        }
        let mut option_text = body.trim().to_string();
        if let Some(max) = max_len {
            if option_text.len() > max {
                let mut cut = max;
                while !option_text.is_char_boundary(cut) {
                    cut -= 1;
                }
                option_text.truncate(cut);
            }
        }
        options.push(QuestionOption {
            key: key.to_string(),
            text: option_text,
        });
    }
    options
}

#[cfg(test)]
#[path = "question_tests.rs"]
mod tests;
