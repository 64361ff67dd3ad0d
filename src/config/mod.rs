//! Configuration for oplogger.
//!
//! Two files live in the base directory (`$OPLOGGER_DIR`, else `~/.oplogger`):
//!
//! - `oplogger.conf` - the user-editable list of highlighted tools, see [`tools`]
//! - `config.toml` - report, detector and session settings, see [`Config`]

pub mod tools;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use tools::ToolSet;

/// Environment variable overriding the base directory.
pub const BASE_DIR_ENV: &str = "OPLOGGER_DIR";

/// Errors from loading or saving `config.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine home directory (set {BASE_DIR_ENV})")]
    NoHomeDir,

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Settings loaded from `config.toml`. Every field has a default, so a
/// missing file or a partial file is fine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub report: ReportConfig,
    pub detector: DetectorConfig,
    pub session: SessionConfig,
}

/// Rendering settings for the two Markdown documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output lines kept from the start of a long block
    pub head_lines: usize,
    /// Output lines kept from the end of a long block
    pub tail_lines: usize,
    /// Commands longer than this are shortened in headings
    pub max_heading_width: usize,
    /// File name of the full session report
    pub report_file: String,
    /// File name of the commands-only document
    pub commands_file: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            head_lines: 100,
            tail_lines: 50,
            max_heading_width: 120,
            report_file: "session_log.md".to_string(),
            commands_file: "commands_only.md".to_string(),
        }
    }
}

/// Prompt detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Additional prompt regexes, tried before the built-in ones.
    /// The end of the match marks the start of the command.
    pub extra_prompt_patterns: Vec<String>,
    /// Upper bound on lines folded into one command as continuations
    pub max_continuation_lines: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            extra_prompt_patterns: Vec::new(),
            max_continuation_lines: 200,
        }
    }
}

/// Capture session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory (relative to the working directory) that receives captures
    pub logs_dir: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            logs_dir: "oplogs".to_string(),
        }
    }
}

/// Base directory for configuration and session state.
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(BASE_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".oplogger"))
        .ok_or(ConfigError::NoHomeDir)
}

impl Config {
    /// Path of `config.toml`.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(base_dir()?.join("config.toml"))
    }

    /// Path of the tool list.
    pub fn tools_path() -> Result<PathBuf, ConfigError> {
        Ok(base_dir()?.join("oplogger.conf"))
    }

    /// Load `config.toml`, falling back to defaults when it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config to `config.toml`, creating the base directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|source| ConfigError::Io { path, source })
    }
}
