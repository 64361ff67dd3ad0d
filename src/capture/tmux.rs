//! tmux capture driver.
//!
//! Every pane of the current tmux session gets its own capture file:
//! a metadata header is written, then `pipe-pane` streams the pane output
//! through the hidden `oplogger pipe <FILE>` command. Hooks on
//! `after-split-window` / `after-new-window` run `oplogger attach` so
//! panes created later are logged too.

use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::Local;
use tracing::{debug, warn};

use super::filename::pane_filename;
use super::header::{write_header, CaptureMeta};
use super::CaptureError;

const HOOK_EVENTS: &[&str] = &["after-split-window", "after-new-window"];

/// `list-panes` / `display-message` format: id, window, pane, cwd.
const PANE_FORMAT: &str = "#{pane_id}\t#{window_index}\t#{pane_index}\t#{pane_current_path}";

/// Whether this process runs inside tmux.
pub fn in_tmux() -> bool {
    env::var_os("TMUX").is_some_and(|v| !v.is_empty())
}

/// A tmux pane as reported by `list-panes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pane {
    pub id: String,
    pub window: u32,
    pub pane: u32,
    pub cwd: String,
}

/// Parse `PANE_FORMAT` output, skipping lines that do not fit.
pub fn parse_panes(output: &str) -> Vec<Pane> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let id = parts.next()?.trim();
            let window = parts.next()?.trim().parse().ok()?;
            let pane = parts.next()?.trim().parse().ok()?;
            let cwd = parts.next().unwrap_or("").trim();
            if id.is_empty() {
                return None;
            }
            Some(Pane {
                id: id.to_string(),
                window,
                pane,
                cwd: cwd.to_string(),
            })
        })
        .collect()
}

/// Quote a value for `sh`.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Shell command given to `pipe-pane`.
pub fn pipe_command(exe: &Path, log: &Path) -> String {
    format!(
        "{} pipe {}",
        shell_quote(&exe.to_string_lossy()),
        shell_quote(&log.to_string_lossy())
    )
}

/// tmux command installed as a hook for new panes.
pub fn hook_command(exe: &Path, dir: &Path) -> String {
    let shell = format!(
        "{} attach --dir {}",
        shell_quote(&exe.to_string_lossy()),
        shell_quote(&dir.to_string_lossy())
    );
    format!("run-shell \"{}\"", shell.replace('"', "\\\""))
}

fn tmux(args: &[&str]) -> Result<String, CaptureError> {
    debug!("tmux {}", args.join(" "));
    let output = Command::new("tmux")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| CaptureError::Tmux(format!("cannot run tmux: {}", e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::Tmux(format!(
            "tmux {} failed: {}",
            args.first().unwrap_or(&""),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Name of the tmux session this process runs in.
pub fn current_session() -> Result<String, CaptureError> {
    if !in_tmux() {
        return Err(CaptureError::NotInTmux);
    }
    Ok(tmux(&["display-message", "-p", "#S"])?.trim().to_string())
}

/// Drives `pipe-pane` logging for one tmux session.
#[derive(Debug, Clone)]
pub struct TmuxDriver {
    session: String,
    dir: PathBuf,
    exe: PathBuf,
}

impl TmuxDriver {
    pub fn new(session: impl Into<String>, dir: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        Ok(Self {
            session: session.into(),
            dir: dir.into(),
            exe: env::current_exe()?,
        })
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn list_panes(&self) -> Result<Vec<Pane>, CaptureError> {
        let out = tmux(&["list-panes", "-s", "-t", &self.session, "-F", PANE_FORMAT])?;
        Ok(parse_panes(&out))
    }

    /// Start logging every pane and install the new-pane hooks.
    /// Returns the number of panes attached.
    pub fn start(&self) -> Result<usize, CaptureError> {
        let panes = self.list_panes()?;
        for pane in &panes {
            self.attach(pane)?;
        }
        let hook = hook_command(&self.exe, &self.dir);
        for event in HOOK_EVENTS {
            tmux(&["set-hook", "-t", &self.session, *event, &hook])?;
        }
        Ok(panes.len())
    }

    /// Create the capture file for `pane` and start piping into it.
    pub fn attach(&self, pane: &Pane) -> Result<PathBuf, CaptureError> {
        let now = Local::now();
        let path = self.dir.join(pane_filename(pane.window, pane.pane, &now));

        let meta = CaptureMeta::new()
            .with("type", "tmux")
            .with("pane_id", pane.id.as_str())
            .with("window", pane.window.to_string())
            .with("pane", pane.pane.to_string())
            .with("started", now.to_rfc3339())
            .with("cwd", pane.cwd.as_str());
        let mut out = BufWriter::new(File::create(&path)?);
        write_header(&mut out, &meta)?;
        out.flush()?;

        let command = pipe_command(&self.exe, &path);
        tmux(&["pipe-pane", "-o", "-t", &pane.id, &command])?;
        debug!("Logging pane {} to {}", pane.id, path.display());
        Ok(path)
    }

    /// Attach the pane a hook fired for (the active pane).
    pub fn attach_current(&self) -> Result<PathBuf, CaptureError> {
        let out = tmux(&["display-message", "-p", PANE_FORMAT])?;
        let pane = parse_panes(&out)
            .into_iter()
            .next()
            .ok_or_else(|| CaptureError::Tmux("no active pane".to_string()))?;
        self.attach(&pane)
    }

    /// Stop piping on every pane and remove the hooks. Failures on single
    /// panes are logged and do not stop the rest.
    pub fn stop(&self) -> Result<(), CaptureError> {
        let panes = self.list_panes().unwrap_or_else(|e| {
            warn!("Cannot list panes of {}: {}", self.session, e);
            Vec::new()
        });
        for pane in &panes {
            if let Err(e) = tmux(&["pipe-pane", "-t", &pane.id]) {
                warn!("Cannot stop logging pane {}: {}", pane.id, e);
            }
        }
        for event in HOOK_EVENTS {
            if let Err(e) = tmux(&["set-hook", "-u", "-t", &self.session, *event]) {
                warn!("Cannot remove hook {}: {}", event, e);
            }
        }
        Ok(())
    }
}
