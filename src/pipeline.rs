//! Log-to-report pipeline.
//!
//! Each capture file runs through normalize, detect, build and highlight
//! on its own (in parallel); the resulting blocks are merged into one
//! [`SessionReport`] and published as two Markdown documents.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::blocks::{build_blocks, CommandBlock};
use crate::capture::{self, RawCapture, SourceId};
use crate::config::{Config, ToolSet};
use crate::detect::PromptDetector;
use crate::error::{ParseError, Warning};
use crate::highlight::ToolHighlighter;
use crate::normalize;
use crate::report::{self, SessionReport, SourceSummary};

/// A successful parse run.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub report_path: PathBuf,
    pub commands_path: PathBuf,
    pub warnings: Vec<Warning>,
    pub sources: usize,
    pub commands: usize,
    pub tool_invocations: usize,
}

/// Blocks and summary of one capture.
#[derive(Debug, Clone)]
pub struct ProcessedCapture {
    pub summary: SourceSummary,
    pub blocks: Vec<CommandBlock>,
}

/// Run the per-file stages on one capture.
pub fn process_capture(
    raw: &RawCapture,
    detector: &PromptDetector,
    highlighter: &ToolHighlighter<'_>,
) -> ProcessedCapture {
    let normalized = normalize::normalize(raw);
    let id = SourceId::new(&raw.stem, &normalized.meta);
    let classified = detector.classify(&normalized.lines);
    let mut blocks = build_blocks(&id, classified);
    highlighter.highlight_all(&mut blocks);

    let commands = blocks.iter().filter(|b| b.has_command()).count();
    debug!(
        "{}: {} raw lines, {} normalized, {} blocks, {} commands",
        raw.path.display(),
        raw.lines.len(),
        normalized.lines.len(),
        blocks.len(),
        commands
    );

    ProcessedCapture {
        summary: SourceSummary {
            id,
            meta: normalized.meta,
            commands,
        },
        blocks,
    }
}

/// Parses a session directory into report documents.
#[derive(Debug)]
pub struct SessionParser<'a> {
    config: &'a Config,
    tools: &'a ToolSet,
    report_path: Option<PathBuf>,
}

impl<'a> SessionParser<'a> {
    pub fn new(config: &'a Config, tools: &'a ToolSet) -> Self {
        Self {
            config,
            tools,
            report_path: None,
        }
    }

    /// Write the full report to `path` instead of the session directory.
    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Read and merge every capture in `dir` without writing anything.
    pub fn collect(&self, dir: &Path) -> Result<(SessionReport, Vec<Warning>), ParseError> {
        if !dir.is_dir() {
            return Err(ParseError::InputNotFound {
                path: dir.to_path_buf(),
            });
        }
        let files = capture::discover(dir).map_err(|e| {
            warn!("Cannot list {}: {}", dir.display(), e);
            ParseError::InputNotFound {
                path: dir.to_path_buf(),
            }
        })?;
        if files.is_empty() {
            return Err(ParseError::NoCaptures {
                dir: dir.to_path_buf(),
            });
        }
        self.collect_files(dir, &files)
    }

    /// Read and merge the given capture files. Unreadable ones become warnings.
    fn collect_files(
        &self,
        dir: &Path,
        files: &[PathBuf],
    ) -> Result<(SessionReport, Vec<Warning>), ParseError> {
        let (detector, mut warnings) = PromptDetector::new(&self.config.detector);
        let highlighter = ToolHighlighter::new(self.tools);

        let results: Vec<Result<ProcessedCapture, Warning>> = files
            .par_iter()
            .map(|path| {
                RawCapture::read(path)
                    .map(|raw| process_capture(&raw, &detector, &highlighter))
                    .map_err(|e| Warning::unreadable(path, &e))
            })
            .collect();

        let mut processed = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(p) => processed.push(p),
                Err(w) => {
                    debug!("{}", w);
                    warnings.push(w);
                }
            }
        }
        if processed.is_empty() {
            return Err(ParseError::NoReadableCaptures {
                dir: dir.to_path_buf(),
                skipped: files.len(),
            });
        }

        let mut sources = Vec::with_capacity(processed.len());
        let mut blocks = Vec::new();
        for p in processed {
            sources.push(p.summary);
            blocks.extend(p.blocks);
        }
        Ok((SessionReport::new(sources, blocks), warnings))
    }

    /// Parse `dir` and write both documents.
    pub fn run(&self, dir: &Path) -> Result<ParseOutcome, ParseError> {
        let (report, warnings) = self.collect(dir)?;
        self.publish(dir, report, warnings)
    }

    fn publish(
        &self,
        dir: &Path,
        report: SessionReport,
        warnings: Vec<Warning>,
    ) -> Result<ParseOutcome, ParseError> {
        let report_path = self
            .report_path
            .clone()
            .unwrap_or_else(|| dir.join(&self.config.report.report_file));
        let commands_path = dir.join(&self.config.report.commands_file);

        let full = report::render_full(&report, &self.config.report);
        let commands = report::render_commands(&report);
        report::write_atomic(&report_path, &full)?;
        info!("Wrote {}", report_path.display());
        report::write_atomic(&commands_path, &commands)?;
        info!("Wrote {}", commands_path.display());

        Ok(ParseOutcome {
            report_path,
            commands_path,
            warnings,
            sources: report.sources.len(),
            commands: report.total_commands(),
            tool_invocations: report.tool_invocations(),
        })
    }
}

/// Parse a session directory with the given configuration and tool list.
pub fn parse_session(dir: &Path, config: &Config, tools: &ToolSet) -> Result<ParseOutcome, ParseError> {
    SessionParser::new(config, tools).run(dir)
}
