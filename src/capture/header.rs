//! In-band markers written by the capture drivers.
//!
//! A capture may start with a metadata header:
//!
//! ```text
//! ===OPLOGGER_PANE_START===
//! window: 0
//! pane: 1
//! started: 2025-02-06T10:00:00+00:00
//! cwd: /home/user/targets
//! ===OPLOGGER_PANE_HEADER_END===
//! ```
//!
//! and may interleave timing markers (`===OPLOGGER_TS <RFC 3339>===`) that
//! date every following line.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::{DateTime, FixedOffset, SecondsFormat};

pub const HEADER_START: &str = "===OPLOGGER_PANE_START===";
pub const HEADER_END: &str = "===OPLOGGER_PANE_HEADER_END===";

const TS_PREFIX: &str = "===OPLOGGER_TS ";
const TS_SUFFIX: &str = "===";

/// Key/value metadata from a capture header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureMeta {
    entries: BTreeMap<String, String>,
}

impl CaptureMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Header keys in the order drivers write them.
    const ORDER: &'static [&'static str] = &["type", "pane_id", "window", "pane", "started", "cwd"];

    fn ordered(&self) -> impl Iterator<Item = (&str, &str)> {
        let known = Self::ORDER
            .iter()
            .filter_map(|k| self.entries.get(*k).map(|v| (*k, v.as_str())));
        let rest = self
            .entries
            .iter()
            .filter(|(k, _)| !Self::ORDER.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()));
        known.chain(rest)
    }
}

/// Write a header block.
pub fn write_header<W: Write>(out: &mut W, meta: &CaptureMeta) -> io::Result<()> {
    writeln!(out, "{}", HEADER_START)?;
    for (key, value) in meta.ordered() {
        writeln!(out, "{}: {}", key, value)?;
    }
    writeln!(out, "{}", HEADER_END)
}

/// Parse a header at the top of `lines`.
///
/// Returns the metadata and the number of lines it spans, or `None` when
/// the capture does not start with a complete header.
pub fn parse_header<S: AsRef<str>>(lines: &[S]) -> Option<(CaptureMeta, usize)> {
    let first = lines
        .iter()
        .position(|l| !l.as_ref().trim().is_empty())?;
    if !lines[first].as_ref().contains(HEADER_START) {
        return None;
    }

    let mut meta = CaptureMeta::new();
    for (i, raw) in lines.iter().enumerate().skip(first + 1) {
        let line = raw.as_ref();
        if line.contains(HEADER_END) {
            return Some((meta, i + 1));
        }
        if let Some((key, value)) = line.split_once(':') {
            meta.entries
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    None
}

/// Format a timing marker line (without newline).
pub fn timing_marker(ts: &DateTime<FixedOffset>) -> String {
    format!(
        "{}{}{}",
        TS_PREFIX,
        ts.to_rfc3339_opts(SecondsFormat::Secs, false),
        TS_SUFFIX
    )
}

/// Result of checking a raw line for a timing marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimingMarker {
    /// Not a marker line
    None,
    /// A marker with a valid timestamp
    At(DateTime<FixedOffset>),
    /// Marker-shaped line whose timestamp did not parse
    Invalid,
}

pub fn parse_timing_marker(line: &str) -> TimingMarker {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(body) = line
        .strip_prefix(TS_PREFIX)
        .and_then(|rest| rest.strip_suffix(TS_SUFFIX))
    else {
        return TimingMarker::None;
    };
    match DateTime::parse_from_rfc3339(body.trim()) {
        Ok(ts) => TimingMarker::At(ts),
        Err(_) => TimingMarker::Invalid,
    }
}
