//! Appending terminal output to a capture file with timing markers.
//!
//! Used by the hidden `oplogger pipe <FILE>` command that tmux runs for
//! each logged pane, and by the plain-terminal driver for rendered lines.

use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::{DateTime, FixedOffset, Local};

use super::header::timing_marker;

/// Longest partial line held back before it is written out anyway.
const MAX_PENDING: usize = 64 * 1024;

/// Writer that precedes a line with a timing marker whenever the
/// wall-clock second changed since the last marker.
///
/// A line is dated when its `\n` arrives, not when its first byte does:
/// a shell draws the prompt long before the command is typed after it.
/// Partial lines are held back until then.
#[derive(Debug)]
pub struct TimingWriter<W: Write> {
    out: W,
    last_second: Option<i64>,
    pending: Vec<u8>,
    /// Part of the current line was already written without a marker
    mid_line: bool,
}

impl<W: Write> TimingWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_second: None,
            pending: Vec::new(),
            mid_line: false,
        }
    }

    /// Write a chunk of output received at `now`.
    pub fn write_chunk(&mut self, chunk: &[u8], now: &DateTime<FixedOffset>) -> io::Result<()> {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            self.pending.extend_from_slice(&rest[..=pos]);
            self.emit(now)?;
            self.mid_line = false;
            rest = &rest[pos + 1..];
        }
        self.pending.extend_from_slice(rest);
        if self.pending.len() >= MAX_PENDING {
            self.emit(now)?;
            self.mid_line = true;
        }
        Ok(())
    }

    fn emit(&mut self, now: &DateTime<FixedOffset>) -> io::Result<()> {
        if !self.mid_line && self.last_second != Some(now.timestamp()) {
            writeln!(self.out, "{}", timing_marker(now))?;
            self.last_second = Some(now.timestamp());
        }
        self.out.write_all(&self.pending)?;
        self.pending.clear();
        Ok(())
    }

    /// Write out a trailing partial line, dated `now`, and flush.
    pub fn finish(&mut self, now: &DateTime<FixedOffset>) -> io::Result<()> {
        if !self.pending.is_empty() {
            self.emit(now)?;
            self.mid_line = true;
        }
        self.out.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Current local time with its offset.
pub fn now() -> DateTime<FixedOffset> {
    Local::now().into()
}

/// Copy `input` to the end of `path` until EOF, adding timing markers.
pub fn pipe_to_file<R: Read>(mut input: R, path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = TimingWriter::new(file);
    let mut buf = [0u8; 8192];
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_chunk(&buf[..n], &now())?;
        writer.flush()?;
    }
    writer.finish(&now())
}
