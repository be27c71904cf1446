// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt assembly: policy injections around the user's message.
//!
//! Chat jobs get universal response guidelines, plus a screenshot-capture
//! protocol when the message smells like browser testing and the full
//! design-mockup workflow when it asks for a mockup. Attachments are cited
//! by absolute path, and answers from a previous question pause ride along
//! after a separator. Format jobs get the raw message only.

use regex::Regex;
use relay_core::JobType;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Message keywords that trigger the screenshot-capture protocol.
const TESTING_KEYWORDS: &[&str] = &[
    "playwright",
    "test",
    "screenshot",
    "browser",
    "login",
    "ui test",
];

/// Message keywords that trigger the design-mockup workflow.
const MOCKUP_KEYWORDS: &[&str] = &[
    "mockup",
    "mock up",
    "mock-up",
    "design mockup",
    "html mockup",
    "css mockup",
    "web design",
    "ui mockup",
    "landing page design",
    "page mockup",
    "create a design",
    "wireframe",
    "prototype design",
    "layout mockup",
    "design a page",
    "design a website",
    "page design",
];

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("constant regex pattern is valid"));

/// Everything the injections need to know about a job.
pub struct PromptContext<'a> {
    pub job_id: &'a str,
    pub message: &'a str,
    pub job_type: JobType,
    pub context_answers: &'a str,
    pub image_paths: &'a [PathBuf],
    pub projects_dir: &'a Path,
    pub screenshots_dir: &'a Path,
    pub temp_dir: &'a Path,
}

pub(crate) fn mentions_testing(message: &str) -> bool {
    let lower = message.to_lowercase();
    TESTING_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub(crate) fn mentions_mockup(message: &str) -> bool {
    let lower = message.to_lowercase();
    MOCKUP_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Assemble the full prompt passed to the worker.
pub fn build_prompt(ctx: &PromptContext) -> String {
    let mut prompt = String::new();

    if ctx.job_type == JobType::Chat {
        if mentions_mockup(ctx.message) {
            prompt.push_str(&mockup_block(ctx));
            prompt.push('\n');
        }
        if mentions_testing(ctx.message) {
            prompt.push_str(&screenshot_block(ctx));
            prompt.push('\n');
        }
        prompt.push_str(&universal_block(ctx.projects_dir));
    }

    if !ctx.image_paths.is_empty() {
        prompt.push_str(&image_block(ctx.image_paths));
        prompt.push('\n');
    }

    prompt.push_str(ctx.message);

    if !ctx.context_answers.is_empty() {
        prompt.push_str("\n\n---\nPrevious answers from user:\n");
        prompt.push_str(ctx.context_answers);
    }

    prompt
}

fn universal_block(projects_dir: &Path) -> String {
    let preview_dir = projects_dir.join(".preview");
    format!(
        "\n---\nIMPORTANT RESPONSE GUIDELINES:\n\
         - When providing URLs in your response, ALWAYS format them as clickable markdown links: [http://example.com](http://example.com), never as plain text URLs.\n\
         - If you create any web pages, HTML files, or web applications, deploy them to {preview}/ so they are viewable at [http://127.0.0.1:8800/](http://127.0.0.1:8800/). Copy or write files directly into that directory. For multi-page sites, put the main page as index.html.\n\
         ---\n\n",
        preview = preview_dir.display()
    )
}

fn image_block(paths: &[PathBuf]) -> String {
    let mut block =
        String::from("\n---\nThe user has attached the following image(s). Please read and analyze them:\n");
    for path in paths {
        block.push_str(&format!("- {}\n", path.display()));
    }
    block.push_str("---\n");
    block
}

fn screenshot_block(ctx: &PromptContext) -> String {
    let dir = ctx.screenshots_dir.display();
    let id = ctx.job_id;
    format!(
        "\n---\nIMPORTANT: When running Playwright or browser tests, ALWAYS capture screenshots to document your testing:\n\n\
         1. Save screenshots to: {dir}/\n\
         2. Use descriptive filenames like: {id}_step1_login_page.png, {id}_step2_after_login.png\n\
         3. In your Playwright code, use: await page.screenshot({{ path: '{dir}/{id}_descriptive_name.png', fullPage: true }})\n\
         4. Take screenshots at key moments: before actions, after actions, on errors\n\
         5. After testing, list the screenshots you captured so they can be displayed to the user\n\
         ---\n"
    )
}

fn mockup_block(ctx: &PromptContext) -> String {
    let shots = ctx.screenshots_dir.display().to_string();
    let temp = ctx.temp_dir.display().to_string();
    let id = ctx.job_id;

    let url_section = match URL.find(ctx.message) {
        Some(m) => {
            let target = m.as_str();
            format!(
                "**URL REFERENCE WORKFLOW (do this FIRST):**\n\
                 The user wants designs based on: {target}\n\
                 1. Use Playwright to navigate to {target} and screenshot it\n\
                 2. Save the reference screenshot to: {shots}/{id}_reference.png\n\
                 3. Read the reference screenshot to analyze the design (colors, layout, typography, spacing)\n\
                 4. Your 3 mockup variations should be inspired by but NOT copies of the reference\n\n"
            )
        }
        None => String::new(),
    };

    let replication_section = if ctx.image_paths.is_empty() {
        String::new()
    } else {
        let mut paths = String::new();
        for p in ctx.image_paths {
            paths.push_str(&format!("  - {}\n", p.display()));
        }
        format!(
            "**SCREENSHOT REPLICATION WORKFLOW (do this FIRST):**\n\
             The user has attached screenshot(s) to replicate/restyle:\n{paths}\
             1. Read and analyze the attached screenshot(s): layout structure, components, colors, fonts, spacing\n\
             2. Variation A should be a faithful recreation of the screenshot\n\
             3. Variation B should be an improved version (better spacing, modern typography)\n\
             4. Variation C should be an alternative aesthetic (different color scheme or layout)\n\n"
        )
    };

    format!(
        "\n---\nDESIGN MOCKUP WORKFLOW - Follow these steps precisely:\n\n\
         {url_section}{replication_section}\
         **STEP 1 - Generate 3 HTML Design Variations:**\n\
         Create 3 distinct, self-contained HTML files. Each must be complete with DOCTYPE, head, body, and all CSS in a <style> tag.\n\
         Include <link href=\"https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap\" rel=\"stylesheet\"> for clean typography.\n\n\
         CRITICAL - Each variation MUST be DRAMATICALLY different, with completely different visual identities:\n\n\
         **Variation A - \"Bold & Dark\"**: dark background, high-contrast accent colors, large bold typography, full-width sections.\n\
         **Variation B - \"Light & Clean\"**: bright background, soft pastel accents, elegant thin typography, card-based layouts with subtle shadows.\n\
         **Variation C - \"Creative & Colorful\"**: gradient or split-color sections, rich multi-color palette, asymmetric or overlapping layout.\n\n\
         Use realistic placeholder content (believable text, not lorem ipsum) and save the files to:\n\
         \x20\x20{temp}/{id}_mockup_a.html\n\
         \x20\x20{temp}/{id}_mockup_b.html\n\
         \x20\x20{temp}/{id}_mockup_c.html\n\n\
         **STEP 2 - Screenshot Each Mockup:**\n\
         Write a Playwright script (run with: node /tmp/mockup_screenshot.js) that loads each file:// page at 1280x720 and saves full-page screenshots to:\n\
         \x20\x20{shots}/{id}_mockup_a.png\n\
         \x20\x20{shots}/{id}_mockup_b.png\n\
         \x20\x20{shots}/{id}_mockup_c.png\n\n\
         **STEP 3 - Self-Review (REQUIRED):**\n\
         Read EACH screenshot you just created and critique layout and spacing, typography, color harmony, and overall polish.\n\n\
         **STEP 4 - Refine the Best:**\n\
         Pick the strongest design (or combine the best elements), create a final polished version at {temp}/{id}_mockup_final.html, screenshot it to {shots}/{id}_mockup_final.png, and verify it meets your quality standards.\n\n\
         **STEP 5 - Present Results:**\n\
         In your response, explicitly list all screenshot paths so they are auto-discovered:\n\
         \x20\x20{shots}/{id}_mockup_a.png\n\
         \x20\x20{shots}/{id}_mockup_b.png\n\
         \x20\x20{shots}/{id}_mockup_c.png\n\
         \x20\x20{shots}/{id}_mockup_final.png\n\n\
         Explain your design choices for each variation, why you chose the final version, and include the complete HTML source for the final mockup in a code block.\n\n\
         IMPORTANT: The HTML files will be served for interactive preview. Make sure they are complete, valid HTML documents that render correctly standalone.\n\
         ---\n"
    )
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
