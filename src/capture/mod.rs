//! Raw capture files and their discovery.
//!
//! The capture drivers ([`tmux`], [`pty`], [`pipe`]) write one file per
//! pane into a session directory; [`discover`] finds them again and
//! [`RawCapture::read`] loads one for the pipeline.

pub mod filename;
pub mod header;
pub mod pipe;
#[cfg(unix)]
pub mod pty;
pub mod tmux;

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use filename::ParsedName;
pub use header::CaptureMeta;

/// Errors raised by the capture drivers.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("tmux command failed: {0}")]
    Tmux(String),

    #[error("Not running inside tmux")]
    NotInTmux,

    #[error("stdin is not a terminal")]
    NotATty,

    #[error("Pseudo-terminal setup failed: {0}")]
    Pty(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What kind of terminal produced a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    /// Plain terminal (pseudo-terminal capture)
    Terminal,
    /// A tmux pane
    Pane { window: u32, pane: u32 },
    /// A `*.log` file without a recognized name
    Unknown,
}

/// Identity of a capture source. Ordering is the merge fallback order:
/// kind (terminal, then panes by window/pane), start stamp, file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId {
    pub kind: SourceKind,
    /// `YYYYMMDD_HHMMSS` from the file name, if present
    pub stamp: Option<String>,
    /// File stem, unique within a directory
    pub stem: String,
}

impl SourceId {
    /// Derive the identity from a file stem and header metadata.
    /// Header window/pane values win over the file name.
    pub fn new(stem: &str, meta: &CaptureMeta) -> Self {
        let parsed = filename::parse_stem(stem);
        let (mut kind, stamp) = match parsed {
            ParsedName::Pane {
                window,
                pane,
                stamp,
            } => (SourceKind::Pane { window, pane }, Some(stamp)),
            ParsedName::Terminal { stamp } => (SourceKind::Terminal, Some(stamp)),
            ParsedName::Other => (SourceKind::Unknown, None),
        };

        if let (Some(window), Some(pane)) = (meta.get_u32("window"), meta.get_u32("pane")) {
            kind = SourceKind::Pane { window, pane };
        } else if kind == SourceKind::Unknown && meta.get("type") == Some("plain") {
            kind = SourceKind::Terminal;
        }

        Self {
            kind,
            stamp,
            stem: stem.to_string(),
        }
    }

    /// Human readable label used in the report.
    pub fn label(&self) -> String {
        match self.kind {
            SourceKind::Pane { window, pane } => format!("Window {} / Pane {}", window, pane),
            SourceKind::Terminal => "Terminal".to_string(),
            SourceKind::Unknown => self.stem.clone(),
        }
    }
}

impl Ord for SourceId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.stamp.cmp(&other.stamp))
            .then_with(|| self.stem.cmp(&other.stem))
    }
}

impl PartialOrd for SourceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A capture file as read from disk: raw lines, split on `\n`.
#[derive(Debug, Clone)]
pub struct RawCapture {
    pub path: PathBuf,
    pub stem: String,
    pub lines: Vec<Vec<u8>>,
}

impl RawCapture {
    /// Read a capture. Reads what is on disk right now, even if a driver
    /// is still appending.
    pub fn read(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::from_bytes(path, &bytes))
    }

    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut lines: Vec<Vec<u8>> = bytes.split(|b| *b == b'\n').map(<[u8]>::to_vec).collect();
        // A trailing newline does not start another line.
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        Self {
            path: path.to_path_buf(),
            stem,
            lines,
        }
    }
}

/// Find capture files (`*.log`) directly inside `dir`, sorted by name.
pub fn discover(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_capture = path
            .extension()
            .is_some_and(|ext| ext == filename::CAPTURE_EXTENSION);
        let is_hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if is_capture && !is_hidden && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
