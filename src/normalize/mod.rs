//! Sequence normalization: raw capture bytes to clean plain-text lines.
//!
//! - The optional capture header is split off as metadata
//! - Timing markers are consumed and date the lines that follow them
//! - Every other raw line is rendered through [`renderer::render_line`]
//! - Leading and trailing blank lines of the capture are dropped

pub mod renderer;

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::capture::header::{self, CaptureMeta, TimingMarker};
use crate::capture::RawCapture;

pub use renderer::{render_line, LineRenderer};

/// A rendered line with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLine {
    pub text: String,
    /// 0-based index of the raw line in the capture file
    pub index: usize,
    /// Time of the most recent timing marker, if any
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl NormalizedLine {
    pub fn new(text: impl Into<String>, index: usize) -> Self {
        Self {
            text: text.into(),
            index,
            timestamp: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Result of normalizing one capture.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCapture {
    pub meta: CaptureMeta,
    pub lines: Vec<NormalizedLine>,
}

/// Normalize a raw capture.
pub fn normalize(capture: &RawCapture) -> NormalizedCapture {
    normalize_lines(&capture.lines)
}

/// Normalize raw lines (each without its `\n`).
pub fn normalize_lines<L: AsRef<[u8]>>(raw: &[L]) -> NormalizedCapture {
    // Header detection only needs a lossy view of the first few lines.
    let probe: Vec<String> = raw
        .iter()
        .take(64)
        .map(|l| String::from_utf8_lossy(l.as_ref()).into_owned())
        .collect();
    let (meta, offset) = header::parse_header(&probe).unwrap_or_default();

    let mut lines = Vec::with_capacity(raw.len().saturating_sub(offset));
    let mut current_ts: Option<DateTime<FixedOffset>> = None;

    for (index, bytes) in raw.iter().enumerate().skip(offset) {
        let bytes = bytes.as_ref();
        if bytes.starts_with(b"===OPLOGGER_TS") {
            match header::parse_timing_marker(&String::from_utf8_lossy(bytes)) {
                TimingMarker::At(ts) => {
                    current_ts = Some(ts);
                    continue;
                }
                TimingMarker::Invalid => {
                    debug!("line {}: ignoring malformed timing marker", index + 1);
                    continue;
                }
                TimingMarker::None => {}
            }
        }

        lines.push(NormalizedLine {
            text: render_line(bytes),
            index,
            timestamp: current_ts,
        });
    }

    let first = lines.iter().position(|l| !l.is_blank());
    match first {
        Some(first) => {
            let last = lines
                .iter()
                .rposition(|l| !l.is_blank())
                .unwrap_or(first);
            lines.truncate(last + 1);
            lines.drain(..first);
        }
        None => lines.clear(),
    }

    NormalizedCapture { meta, lines }
}
