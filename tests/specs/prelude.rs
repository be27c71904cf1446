//! Shared harness for daemon specs.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// A temporary relay installation with a fake worker binary.
pub struct Harness {
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("projects/demo")).unwrap();
        let harness = Harness { dir };
        harness.install_worker(
            r#"printf '%s\n' '{"type":"assistant","message":{"content":[{"type":"text","text":"hi there"}]}}'
printf '%s\n' '{"type":"result","result":"hi there"}'"#,
        );
        harness
    }

    /// Install a fake worker script the daemon will spawn instead of the CLI.
    pub fn install_worker(&self, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.worker_path();
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn worker_path(&self) -> PathBuf {
        self.dir.path().join("fake-claude")
    }

    pub fn queue_dir(&self) -> PathBuf {
        self.dir.path().join(".queue")
    }

    /// Spawn relayd against this harness directory.
    pub fn spawn_daemon(&self) -> Child {
        Command::new(daemon_bin())
            .env("RELAY_DIR", self.dir.path())
            .env("RELAY_USER", "axion")
            .env("RELAY_CLAUDE_BIN", self.worker_path())
            .env("RELAY_PROJECTS_DIR", self.dir.path().join("projects"))
            .env("CLAUDE_CONFIG_DIR", self.dir.path().join("claude"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap()
    }

    /// Drop a pending job file into the queue.
    pub fn submit_job(&self, id: &str, message: &str, project: &str) {
        std::fs::create_dir_all(self.queue_dir()).unwrap();
        let job = serde_json::json!({
            "id": id,
            "status": "pending",
            "message": message,
            "model": "sonnet",
            "project": project,
            "created": 1000.0,
        });
        // Producers write atomically too.
        let tmp = self.queue_dir().join(format!("{id}.json.tmp"));
        std::fs::write(&tmp, serde_json::to_vec(&job).unwrap()).unwrap();
        std::fs::rename(tmp, self.queue_dir().join(format!("{id}.json"))).unwrap();
    }

    pub fn result_path(&self, id: &str) -> PathBuf {
        self.queue_dir().join(format!("{id}.result"))
    }
}

/// Path of the built relayd binary (next to the test executable).
pub fn daemon_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // test binary name
    path.pop(); // deps/
    path.push("relayd");
    path
}

/// Poll until `condition` holds or `timeout` elapses.
pub fn wait_for(condition: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    condition()
}

/// SIGTERM a child and wait for exit, returning the exit code.
pub fn terminate_and_wait(child: &mut Child) -> Option<i32> {
    let _ = Command::new("kill")
        .arg(child.id().to_string())
        .status();
    let deadline = Instant::now() + Duration::from_secs(15);
    while Instant::now() < deadline {
        if let Ok(Some(status)) = child.try_wait() {
            return status.code();
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    let _ = child.kill();
    None
}

/// Read a job record field from the queue.
pub fn job_status(queue_dir: &Path, id: &str) -> Option<String> {
    let content = std::fs::read_to_string(queue_dir.join(format!("{id}.json"))).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    value["status"].as_str().map(String::from)
}
