// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attachment materialization.
//!
//! Producers inline images as base64; the worker wants file paths. Each image
//! lands next to the job file as `<id>_img<n>.<ext>` and is deleted on job
//! teardown.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use relay_core::ImageAttachment;
use relay_storage::Layout;
use std::path::PathBuf;

/// Write each attachment to disk, returning the paths that materialized.
/// Undecodable images are logged and skipped.
pub fn save_images(layout: &Layout, job_id: &str, images: &[ImageAttachment]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for (i, image) in images.iter().enumerate() {
        if image.data.is_empty() {
            continue;
        }
        // Accept full data URLs - the payload follows the first comma.
        let payload = image
            .data
            .split_once(',')
            .map(|(_, rest)| rest)
            .unwrap_or(&image.data);

        let path = layout.image_path(job_id, i, extension_for(&image.mime));
        match BASE64.decode(payload) {
            Ok(bytes) => match std::fs::write(&path, bytes) {
                Ok(()) => paths.push(path),
                Err(e) => {
                    tracing::error!(index = i, error = %e, "failed to save image");
                }
            },
            Err(e) => {
                tracing::error!(index = i, error = %e, "failed to decode image");
            }
        }
    }
    paths
}

fn extension_for(mime: &str) -> &'static str {
    if mime.contains("jpeg") || mime.contains("jpg") {
        "jpg"
    } else if mime.contains("gif") {
        "gif"
    } else if mime.contains("webp") {
        "webp"
    } else {
        "png"
    }
}

#[cfg(test)]
#[path = "images_tests.rs"]
mod tests;
