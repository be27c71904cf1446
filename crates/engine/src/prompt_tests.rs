// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::JobType;

fn ctx<'a>(message: &'a str, job_type: JobType, images: &'a [PathBuf]) -> PromptContext<'a> {
    PromptContext {
        job_id: "ab12",
        message,
        job_type,
        context_answers: "",
        image_paths: images,
        projects_dir: Path::new("/opt/clawd/projects"),
        screenshots_dir: Path::new("/srv/relay/.screenshots"),
        temp_dir: Path::new("/srv/relay/.temp"),
    }
}

#[test]
fn chat_jobs_get_universal_guidelines() {
    let prompt = build_prompt(&ctx("hello", JobType::Chat, &[]));
    assert!(prompt.contains("IMPORTANT RESPONSE GUIDELINES"));
    assert!(prompt.contains("clickable markdown links"));
    assert!(prompt.contains("/opt/clawd/projects/.preview/"));
    assert!(prompt.ends_with("hello"));
}

#[test]
fn format_jobs_get_the_raw_message() {
    let prompt = build_prompt(&ctx("reformat this", JobType::Format, &[]));
    assert_eq!(prompt, "reformat this");
}

#[yare::parameterized(
    playwright = { "run the playwright suite" },
    screenshot = { "take a screenshot of the page" },
    browser    = { "open it in a browser" },
    login      = { "check the login flow" },
)]
fn testing_keywords_add_screenshot_protocol(message: &str) {
    let prompt = build_prompt(&ctx(message, JobType::Chat, &[]));
    assert!(prompt.contains("ALWAYS capture screenshots"));
    assert!(prompt.contains("/srv/relay/.screenshots/"));
    assert!(prompt.contains("ab12_step1_login_page.png"));
}

#[test]
fn plain_chat_has_no_screenshot_protocol() {
    let prompt = build_prompt(&ctx("summarize the readme", JobType::Chat, &[]));
    assert!(!prompt.contains("ALWAYS capture screenshots"));
}

#[test]
fn mockup_request_gets_full_workflow() {
    let prompt = build_prompt(&ctx("create a landing page design mockup", JobType::Chat, &[]));
    assert!(prompt.contains("DESIGN MOCKUP WORKFLOW"));
    assert!(prompt.contains("3 HTML Design Variations"));
    assert!(prompt.contains("/srv/relay/.temp/ab12_mockup_a.html"));
    assert!(prompt.contains("/srv/relay/.screenshots/ab12_mockup_final.png"));
    assert!(prompt.contains("Self-Review"));
    assert!(prompt.contains("Refine the Best"));
    assert!(prompt.contains("Present Results"));
}

#[test]
fn mockup_with_url_adds_reference_workflow() {
    let prompt = build_prompt(&ctx(
        "make a mockup based on https://example.com/home",
        JobType::Chat,
        &[],
    ));
    assert!(prompt.contains("URL REFERENCE WORKFLOW"));
    assert!(prompt.contains("https://example.com/home"));
    assert!(prompt.contains("ab12_reference.png"));
}

#[test]
fn mockup_with_images_adds_replication_workflow() {
    let images = vec![PathBuf::from("/srv/relay/.queue/ab12_img0.png")];
    let prompt = build_prompt(&ctx("replicate this mockup", JobType::Chat, &images));
    assert!(prompt.contains("SCREENSHOT REPLICATION WORKFLOW"));
    assert!(prompt.contains("/srv/relay/.queue/ab12_img0.png"));
}

#[test]
fn attached_images_are_cited_by_path() {
    let images = vec![
        PathBuf::from("/srv/relay/.queue/ab12_img0.png"),
        PathBuf::from("/srv/relay/.queue/ab12_img1.jpg"),
    ];
    let prompt = build_prompt(&ctx("what is in these?", JobType::Chat, &images));
    assert!(prompt.contains("The user has attached the following image(s)"));
    assert!(prompt.contains("- /srv/relay/.queue/ab12_img0.png"));
    assert!(prompt.contains("- /srv/relay/.queue/ab12_img1.jpg"));
}

#[test]
fn context_answers_ride_after_separator() {
    let mut context = ctx("continue", JobType::Chat, &[]);
    context.context_answers = "Q1: 1";
    let prompt = build_prompt(&context);
    assert!(prompt.contains("continue\n\n---\nPrevious answers from user:\nQ1: 1"));
}

#[test]
fn keyword_matching_is_case_insensitive() {
    assert!(mentions_testing("Run the PLAYWRIGHT tests"));
    assert!(mentions_mockup("Design A Website for me"));
    assert!(!mentions_mockup("fix the parser"));
}
