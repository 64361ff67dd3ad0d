//! Session report: merging blocks from all sources and rendering the two
//! Markdown documents.

pub mod commands;
pub mod full;
pub mod markdown;
pub mod writer;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::blocks::CommandBlock;
use crate::capture::filename::STAMP_FORMAT;
use crate::capture::{CaptureMeta, SourceId};

pub use commands::render_commands;
pub use full::render_full;
pub use writer::write_atomic;

/// Display format for timestamps in the documents.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Per-source facts shown in the report header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub id: SourceId,
    pub meta: CaptureMeta,
    /// Blocks with a non-empty command
    pub commands: usize,
}

impl SourceSummary {
    /// Start time from the header, else from the file name stamp.
    pub fn started(&self) -> Option<String> {
        if let Some(started) = self.meta.get("started") {
            return Some(match DateTime::parse_from_rfc3339(started) {
                Ok(ts) => ts.format(TIME_FORMAT).to_string(),
                Err(_) => started.to_string(),
            });
        }
        let stamp = self.id.stamp.as_deref()?;
        NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
            .ok()
            .map(|ts| ts.format(TIME_FORMAT).to_string())
    }

    pub fn cwd(&self) -> Option<&str> {
        self.meta.get("cwd")
    }
}

/// Merge order: timestamped blocks by time (untimed first), then source
/// identity, then ordinal within the source.
pub fn merge_order(a: &CommandBlock, b: &CommandBlock) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.ordinal.cmp(&b.ordinal))
}

/// All blocks of a session in merge order.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub sources: Vec<SourceSummary>,
    pub blocks: Vec<CommandBlock>,
}

impl SessionReport {
    pub fn new(mut sources: Vec<SourceSummary>, mut blocks: Vec<CommandBlock>) -> Self {
        sources.sort_by(|a, b| a.id.cmp(&b.id));
        blocks.sort_by(merge_order);
        Self { sources, blocks }
    }

    /// Blocks with a command, in merge order.
    pub fn commands(&self) -> impl Iterator<Item = &CommandBlock> {
        self.blocks.iter().filter(|b| b.has_command())
    }

    pub fn total_commands(&self) -> usize {
        self.commands().count()
    }

    pub fn tool_invocations(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_security_tool).count()
    }

    /// Invocations per tool, most used first, ties by name.
    pub fn tool_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for tool in self.blocks.iter().filter_map(|b| b.matched_tool.as_deref()) {
            *counts.entry(tool).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(name, n)| (name.to_string(), n))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }
}

/// Output lines as displayed: trailing blank lines dropped, and the middle
/// replaced by an omission count when longer than `head + tail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputView<'a> {
    pub head: &'a [String],
    pub omitted: usize,
    pub tail: &'a [String],
}

impl<'a> OutputView<'a> {
    pub fn new(output: &'a [String], head: usize, tail: usize) -> Self {
        let len = output
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map_or(0, |i| i + 1);
        let output = &output[..len];

        if len > head.saturating_add(tail) {
            Self {
                head: &output[..head],
                omitted: len - head - tail,
                tail: &output[len - tail..],
            }
        } else {
            Self {
                head: output,
                omitted: 0,
                tail: &[],
            }
        }
    }

    /// Number of output lines before truncation.
    pub fn total(&self) -> usize {
        self.head.len() + self.omitted + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.omitted > 0
    }
}
