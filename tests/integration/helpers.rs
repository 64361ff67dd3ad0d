//! Shared helpers for the integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A session directory holding capture files.
pub struct SessionDir {
    pub dir: TempDir,
}

impl SessionDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a capture file and return its path.
    pub fn capture(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content).expect("Failed to write capture");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).expect("Failed to read output")
    }
}

/// Capture header as written by the tmux driver.
pub fn pane_header(window: u32, pane: u32, started: &str, cwd: &str) -> String {
    format!(
        "===OPLOGGER_PANE_START===\n\
         type: tmux\n\
         pane_id: %{window}{pane}\n\
         window: {window}\n\
         pane: {pane}\n\
         started: {started}\n\
         cwd: {cwd}\n\
         ===OPLOGGER_PANE_HEADER_END===\n"
    )
}

/// Timing marker line.
pub fn ts(time: &str) -> String {
    format!("===OPLOGGER_TS 2025-02-06T{}+00:00===\n", time)
}

/// The oplogger binary with its base directory pointed at `base`.
pub fn oplogger(base: &Path) -> Command {
    let mut cmd = Command::cargo_bin("oplogger").expect("binary not built");
    cmd.env("OPLOGGER_DIR", base)
        .env("NO_COLOR", "1")
        .env_remove("TMUX")
        .env_remove("RUST_LOG");
    cmd
}
