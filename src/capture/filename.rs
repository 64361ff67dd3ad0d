//! Capture file naming.
//!
//! Capture files encode their source and start time in the name:
//!
//! - `pane_w{window}_p{pane}_{YYYYMMDD_HHMMSS}.log` for tmux panes
//!   (`pane_{window}_{pane}_{...}.log` is accepted as well)
//! - `terminal_{YYYYMMDD_HHMMSS}.log` for a plain terminal
//!
//! Any other `*.log` file is still a capture; it is identified by its stem.

use chrono::{DateTime, NaiveDateTime, TimeZone};

/// Extension shared by all capture files.
pub const CAPTURE_EXTENSION: &str = "log";

/// `strftime` format of the timestamp component.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// What a capture file name says about its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedName {
    Pane {
        window: u32,
        pane: u32,
        stamp: String,
    },
    Terminal {
        stamp: String,
    },
    Other,
}

/// File name for a tmux pane capture started at `now`.
pub fn pane_filename<Tz: TimeZone>(window: u32, pane: u32, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "pane_w{}_p{}_{}.{}",
        window,
        pane,
        now.format(STAMP_FORMAT),
        CAPTURE_EXTENSION
    )
}

/// File name for a plain terminal capture started at `now`.
pub fn terminal_filename<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("terminal_{}.{}", now.format(STAMP_FORMAT), CAPTURE_EXTENSION)
}

/// Parse a capture file stem (name without `.log`).
pub fn parse_stem(stem: &str) -> ParsedName {
    if let Some(rest) = stem.strip_prefix("pane_") {
        if let Some(parsed) = parse_pane(rest) {
            return parsed;
        }
    }
    if let Some(rest) = stem.strip_prefix("terminal_") {
        if is_stamp(rest) {
            return ParsedName::Terminal {
                stamp: rest.to_string(),
            };
        }
    }
    ParsedName::Other
}

/// `w0_p1_20250206_100000` or `0_1_20250206_100000`.
fn parse_pane(rest: &str) -> Option<ParsedName> {
    let mut parts = rest.splitn(3, '_');
    let window = parts.next()?;
    let pane = parts.next()?;
    let stamp = parts.next()?;

    let window = window.strip_prefix('w').unwrap_or(window).parse().ok()?;
    let pane = pane.strip_prefix('p').unwrap_or(pane).parse().ok()?;
    if !is_stamp(stamp) {
        return None;
    }

    Some(ParsedName::Pane {
        window,
        pane,
        stamp: stamp.to_string(),
    })
}

fn is_stamp(s: &str) -> bool {
    NaiveDateTime::parse_from_str(s, STAMP_FORMAT).is_ok()
}
