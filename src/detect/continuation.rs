//! Multi-line command tracking.
//!
//! A command keeps absorbing lines while the shell would still be waiting
//! for input: a trailing backslash or pipe/`&&`/`||`, an open quote, or a
//! here-document whose terminator has not been seen yet.

use std::collections::VecDeque;

use regex::Regex;

/// Secondary prompt (`PS2`): `> ` in bash, `quote> `/`dquote> `/`heredoc> `
/// in zsh.
const PS2_PATTERN: &str = r"^(?:[a-z]+(?: [a-z]+)*)?> ?";

/// Strips secondary prompts from continuation lines.
#[derive(Debug, Clone)]
pub struct Ps2 {
    regex: Option<Regex>,
}

impl Default for Ps2 {
    fn default() -> Self {
        Self {
            regex: Regex::new(PS2_PATTERN).ok(),
        }
    }
}

impl Ps2 {
    /// Remove a leading secondary prompt. Returns the remaining text and
    /// whether a prompt was present.
    pub fn strip<'a>(&self, line: &'a str) -> (&'a str, bool) {
        match self.regex.as_ref().and_then(|re| re.find(line)) {
            Some(m) if m.start() == 0 && m.end() > 0 => (&line[m.end()..], true),
            _ => (line, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Heredoc {
    delimiter: String,
    strip_tabs: bool,
}

/// Shell-syntax state of a command being typed.
#[derive(Debug, Clone, Default)]
pub struct Continuation {
    quote: Option<char>,
    heredocs: VecDeque<Heredoc>,
    /// Line ended with `\`, `|`, `&&` or `||`
    trailing: bool,
}

/// Why a command is still incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    /// Explicit line continuation or dangling operator
    Trailing,
    /// Inside a here-document body
    Heredoc,
    /// Inside an unterminated quote
    Quote,
}

impl Continuation {
    /// State after the first line of a command.
    pub fn start(command: &str) -> Self {
        let mut state = Self::default();
        state.feed(command);
        state
    }

    /// What the command is still waiting for, if anything.
    pub fn pending(&self) -> Option<Pending> {
        if !self.heredocs.is_empty() {
            Some(Pending::Heredoc)
        } else if self.quote.is_some() {
            Some(Pending::Quote)
        } else if self.trailing {
            Some(Pending::Trailing)
        } else {
            None
        }
    }

    pub fn is_incomplete(&self) -> bool {
        self.pending().is_some()
    }

    /// Account for one more line of the command.
    pub fn feed(&mut self, line: &str) {
        if let Some(doc) = self.heredocs.front() {
            let body = if doc.strip_tabs {
                line.trim_start_matches('\t')
            } else {
                line
            };
            if body.trim_end() == doc.delimiter {
                self.heredocs.pop_front();
            }
            return;
        }
        self.scan(line);
    }

    fn scan(&mut self, line: &str) {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        let mut escaped_eol = false;
        let mut code_end = chars.len();
        // Open `((` arithmetic on this line; `<<` there is a shift
        let mut arith = 0usize;

        while i < chars.len() {
            let c = chars[i];
            match self.quote {
                Some('\'') => {
                    if c == '\'' {
                        self.quote = None;
                    }
                }
                Some(q) => {
                    if c == '\\' {
                        if i + 1 == chars.len() {
                            escaped_eol = true;
                        }
                        i += 1;
                    } else if c == q {
                        self.quote = None;
                    }
                }
                None => match c {
                    '\\' => {
                        if i + 1 == chars.len() {
                            escaped_eol = true;
                        }
                        i += 1;
                    }
                    '\'' | '"' => self.quote = Some(c),
                    '#' if i == 0 || chars[i - 1].is_whitespace() => {
                        code_end = i;
                        break;
                    }
                    '(' if chars.get(i + 1) == Some(&'(') => {
                        arith += 1;
                        i += 1;
                    }
                    ')' if arith > 0 && chars.get(i + 1) == Some(&')') => {
                        arith -= 1;
                        i += 1;
                    }
                    '<' if arith == 0 => {
                        if let Some((doc, consumed)) = heredoc_at(&chars, i) {
                            self.heredocs.push_back(doc);
                            i += consumed;
                            continue;
                        }
                    }
                    _ => {}
                },
            }
            i += 1;
        }

        let code: String = chars[..code_end].iter().collect();
        let code = code.trim_end();
        self.trailing = escaped_eol
            || (self.quote.is_none()
                && (code.ends_with('|') || code.ends_with("&&")));
    }
}

/// Recognize `<<WORD`, `<<-WORD`, `<<'WORD'` at `start`. `<<<` is a
/// here-string and does not open a body.
fn heredoc_at(chars: &[char], start: usize) -> Option<(Heredoc, usize)> {
    if chars.get(start + 1) != Some(&'<') {
        return None;
    }
    if start > 0 && chars[start - 1] == '<' {
        return None;
    }
    let mut i = start + 2;
    if chars.get(i) == Some(&'<') {
        return None;
    }
    let strip_tabs = chars.get(i) == Some(&'-');
    if strip_tabs {
        i += 1;
    }
    while chars.get(i).is_some_and(|c| *c == ' ' || *c == '\t') {
        i += 1;
    }
    let quote = match chars.get(i) {
        Some(q @ ('\'' | '"')) => {
            i += 1;
            Some(*q)
        }
        _ => None,
    };

    let word_start = i;
    match chars.get(i) {
        Some(c) if c.is_ascii_alphabetic() || *c == '_' => {}
        _ => return None,
    }
    while chars
        .get(i)
        .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_')
    {
        i += 1;
    }
    let delimiter: String = chars[word_start..i].iter().collect();
    if let Some(q) = quote {
        if chars.get(i) == Some(&q) {
            i += 1;
        }
    }

    Some((
        Heredoc {
            delimiter,
            strip_tabs,
        },
        i - start,
    ))
}
