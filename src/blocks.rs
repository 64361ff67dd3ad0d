//! Grouping classified lines into command blocks.

use chrono::{DateTime, FixedOffset};

use crate::capture::SourceId;
use crate::detect::{ClassifiedLine, LineTag};

/// One command and the output that followed it, within one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBlock {
    pub source: SourceId,
    /// 0-based creation order within the source
    pub ordinal: usize,
    /// Command text, continuation lines joined with `\n`. Empty for output
    /// that appeared before the first prompt.
    pub command: String,
    pub output: Vec<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub is_security_tool: bool,
    pub matched_tool: Option<String>,
    /// Index of the block's first normalized line
    pub first_line: usize,
    /// Number of normalized lines the block covers
    pub line_count: usize,
}

impl CommandBlock {
    fn new(source: &SourceId, ordinal: usize, first_line: usize) -> Self {
        Self {
            source: source.clone(),
            ordinal,
            command: String::new(),
            output: Vec::new(),
            timestamp: None,
            is_security_tool: false,
            matched_tool: None,
            first_line,
            line_count: 0,
        }
    }

    pub fn has_command(&self) -> bool {
        !self.command.is_empty()
    }

    pub fn is_multiline(&self) -> bool {
        self.command.contains('\n')
    }
}

/// Folds a classified line stream into blocks.
///
/// Every pushed line lands in exactly one block. Output before the first
/// prompt opens a block with an empty command.
#[derive(Debug)]
pub struct BlockBuilder {
    source: SourceId,
    blocks: Vec<CommandBlock>,
    current: Option<CommandBlock>,
    position: usize,
}

impl BlockBuilder {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            blocks: Vec::new(),
            current: None,
            position: 0,
        }
    }

    pub fn push(&mut self, classified: ClassifiedLine) {
        let ClassifiedLine { line, tag } = classified;

        if matches!(tag, LineTag::PromptCommand(_)) || self.current.is_none() {
            if let Some(done) = self.current.take() {
                self.blocks.push(done);
            }
            let mut block = CommandBlock::new(&self.source, self.blocks.len(), self.position);
            block.timestamp = line.timestamp;
            self.current = Some(block);
        }
        let Some(block) = self.current.as_mut() else {
            return;
        };

        match tag {
            LineTag::PromptCommand(command) => block.command = command,
            LineTag::Continuation(text) if block.has_command() => {
                block.command.push('\n');
                block.command.push_str(&text);
            }
            // Not emitted by the detector; kept as output so the line is not lost.
            LineTag::Continuation(_) => block.output.push(line.text),
            LineTag::Output => block.output.push(line.text),
        }
        block.line_count += 1;
        self.position += 1;
    }

    pub fn finish(mut self) -> Vec<CommandBlock> {
        if let Some(done) = self.current.take() {
            self.blocks.push(done);
        }
        self.blocks
    }
}

/// Build the blocks of one source.
pub fn build_blocks(source: &SourceId, lines: Vec<ClassifiedLine>) -> Vec<CommandBlock> {
    let mut builder = BlockBuilder::new(source.clone());
    for line in lines {
        builder.push(line);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureMeta;
    use crate::detect::PromptDetector;
    use crate::normalize::NormalizedLine;
    use chrono::TimeZone;

    fn source() -> SourceId {
        SourceId::new("pane_w0_p0_20250206_100000", &CaptureMeta::new())
    }

    fn build(texts: &[&str]) -> Vec<CommandBlock> {
        let lines: Vec<NormalizedLine> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| NormalizedLine::new(*t, i))
            .collect();
        build_blocks(&source(), PromptDetector::default().classify(&lines))
    }

    #[test]
    fn one_block_per_command() {
        let blocks = build(&["$ nmap -sV 10.0.0.1", "Starting Nmap", "Done", "$ ls", "a.txt"]);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].command, "nmap -sV 10.0.0.1");
        assert_eq!(blocks[0].output, vec!["Starting Nmap", "Done"]);
        assert_eq!(blocks[1].command, "ls");
        assert_eq!(blocks[1].output, vec!["a.txt"]);
        assert_eq!(blocks[1].ordinal, 1);
    }

    #[test]
    fn leading_output_forms_empty_command_block() {
        let blocks = build(&["Last login: Mon", "", "$ id", "uid=0"]);
        assert_eq!(blocks.len(), 2);
        assert!(!blocks[0].has_command());
        assert_eq!(blocks[0].output, vec!["Last login: Mon", ""]);
        assert_eq!(blocks[0].ordinal, 0);
        assert_eq!(blocks[1].command, "id");
    }

    #[test]
    fn continuation_joins_with_newline() {
        let blocks = build(&["$ nmap \\", "> -p 80 host", "open"]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].command, "nmap \\\n-p 80 host");
        assert!(blocks[0].is_multiline());
        assert_eq!(blocks[0].output, vec!["open"]);
    }

    #[test]
    fn every_line_is_assigned_once() {
        let texts = ["banner", "$ a", "1", "$ b \\", "> c", "2", "3", "$ d"];
        let blocks = build(&texts);
        let total: usize = blocks.iter().map(|b| b.line_count).sum();
        assert_eq!(total, texts.len());
        let mut next = 0;
        for b in &blocks {
            assert_eq!(b.first_line, next);
            next += b.line_count;
        }
    }

    #[test]
    fn empty_input_gives_no_blocks() {
        assert!(build(&[]).is_empty());
    }

    #[test]
    fn timestamps_come_from_prompt_lines() {
        let t0 = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 2, 6, 10, 0, 0)
            .unwrap();
        let t1 = t0 + chrono::Duration::seconds(3);
        let mut lines = vec![
            NormalizedLine::new("motd", 0),
            NormalizedLine::new("$ ls", 1),
            NormalizedLine::new("a", 2),
        ];
        lines[0].timestamp = Some(t0);
        lines[1].timestamp = Some(t1);
        lines[2].timestamp = Some(t1 + chrono::Duration::seconds(9));

        let blocks = build_blocks(&source(), PromptDetector::default().classify(&lines));
        assert_eq!(blocks[0].timestamp, Some(t0));
        assert_eq!(blocks[1].timestamp, Some(t1));
    }

    #[test]
    fn untimed_capture_has_no_timestamps() {
        let blocks = build(&["$ ls", "a"]);
        assert_eq!(blocks[0].timestamp, None);
    }
}
