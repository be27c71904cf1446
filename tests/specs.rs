//! Behavioral specifications for the relay watcher daemon.
//!
//! These tests are black-box: they start the `relayd` binary against a
//! temporary queue directory with a fake worker and verify the on-disk
//! protocol producers rely on.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/daemon.rs"]
mod daemon;
