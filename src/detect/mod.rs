//! Prompt boundary detection.
//!
//! Tags every normalized line of a capture as the start of a command, a
//! continuation of the previous command, or output.
//!
//! Matching a single line is a pure function of the line and the pattern
//! set ([`PromptSet::match_line`]). Classifying a whole capture adds two
//! capture-level rules:
//!
//! - If any strong prompt occurs in the capture, bare (loose) matches are
//!   treated as output. Otherwise only the first loose shape seen is
//!   trusted, so `# comment` lines in a `$ `-prompt capture stay output.
//! - While a command is syntactically incomplete, following lines are
//!   continuations (capped by `max_continuation_lines`). A strong prompt
//!   always starts a new command.

pub mod continuation;
pub mod patterns;

use tracing::debug;

use crate::config::DetectorConfig;
use crate::error::Warning;
use crate::normalize::NormalizedLine;

pub use continuation::{Continuation, Pending, Ps2};
pub use patterns::{PromptMatch, PromptSet, Strength};

/// Role of a line in the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineTag {
    /// A prompt followed by the typed command (prompt stripped)
    PromptCommand(String),
    /// Further text of the preceding command (secondary prompt stripped)
    Continuation(String),
    Output,
}

impl LineTag {
    pub fn is_command_start(&self) -> bool {
        matches!(self, LineTag::PromptCommand(_))
    }
}

/// A normalized line and its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub line: NormalizedLine,
    pub tag: LineTag,
}

/// Classifies capture lines.
#[derive(Debug, Clone)]
pub struct PromptDetector {
    prompts: PromptSet,
    ps2: Ps2,
    max_continuation_lines: usize,
}

impl Default for PromptDetector {
    fn default() -> Self {
        Self::with_prompts(PromptSet::builtin(), DetectorConfig::default().max_continuation_lines)
    }
}

impl PromptDetector {
    /// Build from configuration. Invalid user patterns are skipped and
    /// reported.
    pub fn new(config: &DetectorConfig) -> (Self, Vec<Warning>) {
        let (prompts, warnings) = PromptSet::with_extra(&config.extra_prompt_patterns);
        (
            Self::with_prompts(prompts, config.max_continuation_lines),
            warnings,
        )
    }

    pub fn with_prompts(prompts: PromptSet, max_continuation_lines: usize) -> Self {
        Self {
            prompts,
            ps2: Ps2::default(),
            max_continuation_lines,
        }
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    /// Tag a single line in isolation: any prompt match starts a command.
    pub fn classify_line(&self, text: &str) -> LineTag {
        match self.prompts.match_line(text) {
            Some(m) => LineTag::PromptCommand(m.command),
            None => LineTag::Output,
        }
    }

    /// Tag every line of a capture, in order.
    pub fn classify(&self, lines: &[NormalizedLine]) -> Vec<ClassifiedLine> {
        let matches: Vec<Option<PromptMatch>> = lines
            .iter()
            .map(|l| self.prompts.match_line(&l.text))
            .collect();

        let has_strong = matches
            .iter()
            .flatten()
            .any(|m| m.strength == Strength::Strong);
        let loose_shape = if has_strong {
            None
        } else {
            matches.iter().flatten().map(|m| m.pattern).next()
        };
        debug!(
            "classifying {} lines (strong prompts: {}, loose shape: {:?})",
            lines.len(),
            has_strong,
            loose_shape
        );

        let mut out = Vec::with_capacity(lines.len());
        let mut open: Option<Continuation> = None;
        let mut continued = 0usize;

        for (line, found) in lines.iter().zip(matches) {
            let accepted = found.filter(|m| {
                m.strength == Strength::Strong || Some(m.pattern) == loose_shape
            });

            if let Some(state) = open.as_mut() {
                // A loose prompt ends the command unless the line carries a
                // secondary prompt.
                let starts_new = accepted.as_ref().is_some_and(|m| {
                    m.strength == Strength::Strong || !self.ps2.strip(&line.text).1
                });
                if !starts_new && continued < self.max_continuation_lines {
                    if let Some(text) = self.continuation_text(state, &line.text) {
                        state.feed(&text);
                        continued += 1;
                        out.push(ClassifiedLine {
                            line: line.clone(),
                            tag: LineTag::Continuation(text),
                        });
                        continue;
                    }
                }
            }

            let tag = match accepted {
                Some(m) => {
                    let state = Continuation::start(&m.command);
                    open = state.is_incomplete().then_some(state);
                    continued = 0;
                    LineTag::PromptCommand(m.command)
                }
                None => {
                    open = None;
                    LineTag::Output
                }
            };
            out.push(ClassifiedLine {
                line: line.clone(),
                tag,
            });
        }
        out
    }

    /// Text this line contributes to an open command, or `None` if the
    /// line is not a continuation.
    ///
    /// Explicit continuations and here-document bodies accept any line.
    /// An open quote only accepts lines carrying a secondary prompt, so a
    /// stray apostrophe cannot swallow the output that follows.
    fn continuation_text(&self, state: &Continuation, text: &str) -> Option<String> {
        let pending = state.pending()?;
        let (stripped, had_ps2) = self.ps2.strip(text);
        match pending {
            Pending::Trailing | Pending::Heredoc => Some(stripped.to_string()),
            Pending::Quote if had_ps2 => Some(stripped.to_string()),
            Pending::Quote => None,
        }
    }
}
