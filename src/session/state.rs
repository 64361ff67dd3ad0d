//! Active session state (`session.json`).
//!
//! The file exists exactly while a session is running. A file that cannot
//! be read or parsed counts as no session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{self, ConfigError};

const STATE_FILE: &str = "session.json";

/// How the session is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Tmux,
    Plain,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Tmux => "tmux",
            SessionKind::Plain => "plain",
        }
    }
}

/// Persisted description of the running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub dir: PathBuf,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub started: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmux_session: Option<String>,
}

/// Location of the state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `session.json` in the oplogger base directory.
    pub fn default_location() -> Result<Self, ConfigError> {
        Ok(Self::new(config::base_dir()?.join(STATE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Option<SessionState> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!("Ignoring invalid {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, state: &SessionState) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(&self.path, json + "\n")
    }

    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
