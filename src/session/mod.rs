//! Session lifecycle: start capturing, stop, report status, parse.
//!
//! [`SessionManager`] ties the capture drivers, the state file and the
//! report pipeline together. It does not print anything; the command
//! layer turns its outcomes into user-facing messages.

pub mod state;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::capture::{self, tmux, CaptureError};
use crate::config::{self, Config, ConfigError, ToolSet};
use crate::error::ParseError;
use crate::pipeline::{ParseOutcome, SessionParser};

pub use state::{SessionKind, SessionState, StateStore};

/// Errors from session commands.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Already logging in {}", dir.display())]
    AlreadyActive { dir: PathBuf },

    #[error("No active session")]
    NotActive,

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// What `stop` did.
#[derive(Debug)]
pub enum StopOutcome {
    /// Capturing stopped and the report was generated.
    Parsed {
        state: SessionState,
        outcome: ParseOutcome,
    },
    /// The plain-terminal shell was sent `SIGHUP`; the process that
    /// started it generates the report when the shell exits.
    HungUp { pid: i32 },
}

/// Facts shown by `status`.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub state: SessionState,
    pub shell_pid: Option<i32>,
    pub log_files: usize,
    pub total_bytes: u64,
}

/// Drives sessions for one base directory.
#[derive(Debug)]
pub struct SessionManager {
    store: StateStore,
    config: Config,
    tools_path: PathBuf,
}

impl SessionManager {
    pub fn new(store: StateStore, config: Config, tools_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            config,
            tools_path: tools_path.into(),
        }
    }

    /// Manager for the base directory (`$OPLOGGER_DIR` or `~/.oplogger`).
    pub fn from_env() -> Result<Self, SessionError> {
        Ok(Self::new(
            StateStore::default_location()?,
            Config::load()?,
            Config::tools_path()?,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Capture directory for a session started in `cwd`.
    pub fn logs_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.config.session.logs_dir)
    }

    /// Start a session in `cwd`.
    ///
    /// Inside tmux every pane is attached before this returns. For a plain
    /// terminal only the state is recorded; call [`run_plain`](Self::run_plain)
    /// next to run the logged shell.
    pub fn start(&self, cwd: &Path) -> Result<SessionState, SessionError> {
        if let Some(active) = self.store.load() {
            return Err(SessionError::AlreadyActive { dir: active.dir });
        }

        let dir = self.logs_dir(cwd);
        fs::create_dir_all(&dir).map_err(|source| SessionError::Io {
            path: dir.clone(),
            source,
        })?;
        if !self.tools_path.exists() {
            config::tools::write_default(&self.tools_path).map_err(|source| SessionError::Io {
                path: self.tools_path.clone(),
                source,
            })?;
            debug!("Wrote default tool list to {}", self.tools_path.display());
        }

        let state = if tmux::in_tmux() {
            let session = tmux::current_session()?;
            let panes = tmux::TmuxDriver::new(session.as_str(), &dir)?.start()?;
            info!("Attached {} pane(s) of tmux session {}", panes, session);
            SessionState {
                dir,
                kind: SessionKind::Tmux,
                started: Utc::now(),
                tmux_session: Some(session),
            }
        } else {
            SessionState {
                dir,
                kind: SessionKind::Plain,
                started: Utc::now(),
                tmux_session: None,
            }
        };

        self.save_state(&state)?;
        Ok(state)
    }

    /// Run the logged shell of a plain session. Blocks until the shell
    /// exits, then generates the report and clears the state.
    #[cfg(unix)]
    pub fn run_plain(
        &self,
        state: &SessionState,
    ) -> Result<(capture::pty::PlainSession, ParseOutcome), SessionError> {
        let session = match capture::pty::run(&state.dir) {
            Ok(session) => session,
            Err(e) => {
                self.clear_state();
                return Err(e.into());
            }
        };
        debug!("Shell exited with {}", session.exit_code);
        let outcome = self.finish(&state.dir)?;
        Ok((session, outcome))
    }

    /// Stop the active session.
    pub fn stop(&self) -> Result<StopOutcome, SessionError> {
        let state = self.store.load().ok_or(SessionError::NotActive)?;

        match state.kind {
            SessionKind::Tmux => {
                if let Some(session) = &state.tmux_session {
                    tmux::TmuxDriver::new(session.as_str(), &state.dir)?.stop()?;
                }
            }
            SessionKind::Plain => {
                if let Some(pid) = hang_up_shell(&state.dir) {
                    return Ok(StopOutcome::HungUp { pid });
                }
            }
        }

        let outcome = self.finish(&state.dir)?;
        Ok(StopOutcome::Parsed { state, outcome })
    }

    /// The active session, if any.
    pub fn status(&self) -> Option<SessionStatus> {
        let state = self.store.load()?;
        let (log_files, total_bytes) = match capture::discover(&state.dir) {
            Ok(files) => {
                let bytes = files
                    .iter()
                    .filter_map(|f| fs::metadata(f).ok())
                    .map(|m| m.len())
                    .sum();
                (files.len(), bytes)
            }
            Err(e) => {
                debug!("Cannot list {}: {}", state.dir.display(), e);
                (0, 0)
            }
        };
        #[cfg(unix)]
        let shell_pid = capture::pty::read_pid(&state.dir);
        #[cfg(not(unix))]
        let shell_pid = None;

        Some(SessionStatus {
            state,
            shell_pid,
            log_files,
            total_bytes,
        })
    }

    /// Generate the report for `dir`. `output` replaces the default
    /// location of the full report.
    pub fn parse(&self, dir: &Path, output: Option<&Path>) -> Result<ParseOutcome, SessionError> {
        let (tools, tool_warnings) =
            ToolSet::load(&self.tools_path).map_err(|source| SessionError::Io {
                path: self.tools_path.clone(),
                source,
            })?;

        let mut parser = SessionParser::new(&self.config, &tools);
        if let Some(path) = output {
            parser = parser.report_path(path);
        }
        let mut outcome = parser.run(dir)?;
        let mut warnings = tool_warnings;
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Clear the state, then parse. The state goes away even if parsing fails.
    fn finish(&self, dir: &Path) -> Result<ParseOutcome, SessionError> {
        self.clear_state();
        self.parse(dir, None)
    }

    fn save_state(&self, state: &SessionState) -> Result<(), SessionError> {
        self.store.save(state).map_err(|source| SessionError::Io {
            path: self.store.path().to_path_buf(),
            source,
        })
    }

    fn clear_state(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Cannot remove {}: {}", self.store.path().display(), e);
        }
    }
}

/// Send `SIGHUP` to the shell of a plain session. Returns its pid if it
/// was still running.
#[cfg(unix)]
fn hang_up_shell(dir: &Path) -> Option<i32> {
    let pid = capture::pty::read_pid(dir)?;
    match capture::pty::send_hangup(pid) {
        Ok(true) => Some(pid),
        Ok(false) => {
            debug!("Shell {} already exited", pid);
            None
        }
        Err(e) => {
            warn!("Cannot signal shell {}: {}", pid, e);
            None
        }
    }
}

#[cfg(not(unix))]
fn hang_up_shell(_dir: &Path) -> Option<i32> {
    None
}

/// Attach the active pane of the current tmux session to `dir`. Run by the
/// hooks installed on `start`.
pub fn attach_new_pane(dir: &Path) -> Result<PathBuf, SessionError> {
    let session = tmux::current_session()?;
    Ok(tmux::TmuxDriver::new(session, dir)?.attach_current()?)
}
