// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pseudo-terminal spawning for the worker process.
//!
//! The worker's stdout heuristics only stream in real time when talking to a
//! terminal, so the child runs with the PTY slave as its controlling tty.
//! The parent reads the master side only; the slave is closed immediately
//! after spawn. The child becomes a session leader, which makes its pid the
//! process-group id used for group kills.

use nix::pty::{openpty, OpenptyResult, Winsize};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

/// A worker child with the PTY master kept alive for reading.
pub struct PtyChild {
    pub child: Child,
    master: OwnedFd,
}

impl PtyChild {
    /// Process id (== process-group id, the child is a session leader).
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Dup the master side into an async reader.
    ///
    /// The dup'd descriptor is independent of the stored master, so the
    /// reader can be moved into the pump loop while resize/cleanup keep
    /// working on the original.
    pub fn master_reader(&self) -> std::io::Result<tokio::fs::File> {
        let raw = unsafe { libc::dup(self.master.as_raw_fd()) };
        if raw < 0 {
            return Err(std::io::Error::last_os_error());
        }
        // SAFETY: we own `raw` via dup and hand it straight to File.
        Ok(tokio::fs::File::from_std(unsafe {
            std::fs::File::from_raw_fd(raw)
        }))
    }
}

/// Spawn the worker under a freshly-allocated PTY.
///
/// The child is a session leader with the slave as controlling terminal,
/// stdout/stderr on the slave, stdin on /dev/null, and reduced scheduling
/// priority so an expensive worker leaves the host responsive.
pub fn spawn_worker_pty(program: &str, args: &[String], cwd: &Path) -> std::io::Result<PtyChild> {
    let winsize = Winsize {
        ws_row: 40,
        ws_col: 120,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let OpenptyResult { master, slave } =
        openpty(&winsize, None).map_err(std::io::Error::from)?;
    let slave_fd = slave.as_raw_fd();

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    // SAFETY: all syscalls used here are async-signal-safe per POSIX.
    unsafe {
        cmd.pre_exec(move || {
            // New session so the child leads its own process group
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            // PTY slave becomes the controlling terminal
            if libc::ioctl(slave_fd, libc::TIOCSCTTY, 0) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            // stdout/stderr onto the slave; stdin stays /dev/null
            libc::dup2(slave_fd, 1);
            libc::dup2(slave_fd, 2);
            if slave_fd > 2 {
                libc::close(slave_fd);
            }
            // Lower scheduling priority
            let _ = libc::nice(10);
            Ok(())
        });
    }

    let child = cmd.spawn()?;
    // Close the slave in the parent - the child holds its own copy.
    drop(slave);

    Ok(PtyChild { child, master })
}

/// Send SIGTERM to the child's process group.
pub fn terminate_group(pid: u32) {
    let pgid = pid as i32;
    unsafe {
        libc::kill(-pgid, libc::SIGTERM);
    }
}

/// Send SIGKILL to the child's process group.
pub fn kill_group(pid: u32) {
    let pgid = pid as i32;
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
}

/// Graceful stop: SIGTERM, wait up to `grace`, then SIGKILL the whole group.
pub async fn shutdown_group(child: &mut Child, grace: Duration) {
    let Some(pid) = child.id() else {
        return; // already reaped
    };
    terminate_group(pid);
    if tokio::time::timeout(grace, child.wait()).await.is_ok() {
        return;
    }
    tracing::warn!(pid, "worker did not exit after SIGTERM, killing process group");
    kill_group(pid);
    let _ = child.wait().await;
}

#[cfg(test)]
#[path = "pty_tests.rs"]
mod tests;
