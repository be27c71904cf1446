// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use relay_storage::DEFAULT_USER;
use tempfile::TempDir;

fn layout() -> (TempDir, Layout) {
    let dir = TempDir::new().unwrap();
    let layout = Layout::new(dir.path(), DEFAULT_USER);
    layout.ensure_dirs().unwrap();
    (dir, layout)
}

fn png_attachment(bytes: &[u8]) -> ImageAttachment {
    ImageAttachment {
        data: STANDARD.encode(bytes),
        mime: "image/png".to_string(),
    }
}

#[test]
fn saves_plain_base64_payload() {
    let (_dir, layout) = layout();
    let paths = save_images(&layout, "ab12", &[png_attachment(b"pngbytes")]);
    assert_eq!(paths.len(), 1);
    assert!(paths[0].ends_with("ab12_img0.png"));
    assert_eq!(std::fs::read(&paths[0]).unwrap(), b"pngbytes");
}

#[test]
fn accepts_data_url_prefix() {
    let (_dir, layout) = layout();
    let image = ImageAttachment {
        data: format!("data:image/jpeg;base64,{}", STANDARD.encode(b"jpegbytes")),
        mime: "image/jpeg".to_string(),
    };
    let paths = save_images(&layout, "ab12", &[image]);
    assert_eq!(paths.len(), 1);
    assert!(paths[0].ends_with("ab12_img0.jpg"));
    assert_eq!(std::fs::read(&paths[0]).unwrap(), b"jpegbytes");
}

#[yare::parameterized(
    jpeg = { "image/jpeg", "jpg" },
    jpg  = { "image/jpg", "jpg" },
    gif  = { "image/gif", "gif" },
    webp = { "image/webp", "webp" },
    png  = { "image/png", "png" },
    none = { "", "png" },
)]
fn extension_mapping(mime: &str, expected: &str) {
    assert_eq!(extension_for(mime), expected);
}

#[test]
fn undecodable_image_is_skipped() {
    let (_dir, layout) = layout();
    let bad = ImageAttachment {
        data: "!!!not-base64!!!".to_string(),
        mime: "image/png".to_string(),
    };
    let paths = save_images(&layout, "ab12", &[bad, png_attachment(b"ok")]);
    assert_eq!(paths.len(), 1);
    assert!(paths[0].ends_with("ab12_img1.png"));
}

#[test]
fn empty_data_is_skipped() {
    let (_dir, layout) = layout();
    let empty = ImageAttachment {
        data: String::new(),
        mime: "image/png".to_string(),
    };
    assert!(save_images(&layout, "ab12", &[empty]).is_empty());
}
