//! Security-tool highlighting.
//!
//! A block is flagged when a token of its command equals a configured tool
//! name (case-insensitive). A path in command position also matches on its
//! basename, so `sudo /usr/bin/nmap` is flagged while `ls /usr/share/nmap`
//! is not.

use crate::blocks::CommandBlock;
use crate::config::ToolSet;

/// Prefixes that run the following word as the actual command.
const WRAPPERS: &[&str] = &["sudo", "doas", "env", "time", "nohup", "exec", "command"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    command_position: bool,
}

/// Split a command line into words with their command-position flag.
fn tokenize(command: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    // Expecting the command word of a new pipeline segment
    let mut expect_command = true;
    // The next word is a redirection target
    let mut redirect = false;

    let mut flush = |word: &mut String, expect_command: &mut bool, redirect: &mut bool| {
        if word.is_empty() {
            return;
        }
        let text = word.trim_matches(|c| c == '\'' || c == '"').to_string();
        word.clear();
        if text.is_empty() {
            return;
        }

        let mut command_position = false;
        if *redirect {
            *redirect = false;
        } else if *expect_command {
            if is_assignment(&text) || text.starts_with('-') {
                // still waiting for the command word
            } else if WRAPPERS.contains(&text.as_str()) {
                command_position = true;
            } else {
                command_position = true;
                *expect_command = false;
            }
        }
        tokens.push(Token {
            text,
            command_position,
        });
    };

    for c in command.chars() {
        match c {
            c if c.is_whitespace() => {
                flush(&mut word, &mut expect_command, &mut redirect);
                if c == '\n' {
                    expect_command = true;
                }
            }
            '|' | ';' | '&' | '(' | ')' | '`' => {
                flush(&mut word, &mut expect_command, &mut redirect);
                expect_command = true;
                redirect = false;
            }
            '<' | '>' => {
                flush(&mut word, &mut expect_command, &mut redirect);
                redirect = true;
            }
            _ => word.push(c),
        }
    }
    flush(&mut word, &mut expect_command, &mut redirect);
    tokens
}

/// `NAME=value` environment assignment in front of a command.
fn is_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !name.starts_with(|c: char| c.is_ascii_digit())
        }
        None => false,
    }
}

fn token_matches(token: &Token, tool_lower: &str) -> bool {
    let lower = token.text.to_lowercase();
    if lower == tool_lower {
        return true;
    }
    token.command_position
        && lower.contains('/')
        && lower.rsplit('/').next() == Some(tool_lower)
}

/// Matches commands against the configured tool list.
#[derive(Debug, Clone, Copy)]
pub struct ToolHighlighter<'a> {
    tools: &'a ToolSet,
}

impl<'a> ToolHighlighter<'a> {
    pub fn new(tools: &'a ToolSet) -> Self {
        Self { tools }
    }

    /// The first configured tool the command invokes, if any.
    pub fn match_command(&self, command: &str) -> Option<&'a str> {
        if command.trim().is_empty() {
            return None;
        }
        let tokens = tokenize(command);
        self.tools
            .iter()
            .find(|(_, lower)| tokens.iter().any(|t| token_matches(t, lower)))
            .map(|(name, _)| name)
    }

    /// Set the highlight fields of a block.
    pub fn highlight(&self, block: &mut CommandBlock) {
        let matched = self.match_command(&block.command);
        block.is_security_tool = matched.is_some();
        block.matched_tool = matched.map(str::to_string);
    }

    pub fn highlight_all(&self, blocks: &mut [CommandBlock]) {
        for block in blocks {
            self.highlight(block);
        }
    }
}
