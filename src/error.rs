//! Error and warning types for the log-to-report pipeline.

use std::path::PathBuf;

/// Fatal errors of a parse run. No output document is written when one
/// of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("No capture files (*.log) found in {}", dir.display())]
    NoCaptures { dir: PathBuf },

    #[error("None of the {skipped} capture file(s) in {} could be read", dir.display())]
    NoReadableCaptures { dir: PathBuf, skipped: usize },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Problems that were recovered from locally. They are collected and
/// handed back next to a successful result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    #[error("Skipped {}: {reason}", path.display())]
    UnreadableCapture { path: PathBuf, reason: String },

    #[error("{file}:{line}: {reason}")]
    MalformedConfig {
        file: String,
        line: usize,
        reason: String,
    },
}

impl Warning {
    pub fn unreadable(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::UnreadableCapture {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    pub fn malformed(file: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedConfig {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }
}
