//! Prompt shapes.
//!
//! Every pattern is anchored at column 0; the end of the match is where the
//! typed command begins. Patterns are tried in order and the first match
//! wins, so the structured ("strong") shapes come before the bare ones.

use regex::Regex;
use tracing::{debug, warn};

use crate::error::Warning;

/// How much a prompt shape can be trusted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strength {
    /// Structured prompt (`user@host:path$ `); rarely seen in output
    Strong,
    /// Bare marker (`$ `, `# `); easily confused with output
    Loose,
}

/// Optional `[N]` exit-status and `(venv)` decorations in front of a prompt.
const DECOR: &str = r"(?:\[\d+\]\s*)?(?:\([^()\s]+\)\s*)?";

const BUILTIN: &[(&str, Strength, &str)] = &[
    // user@host:~/dir$ , root@box:/tmp#
    ("user-host-path", Strength::Strong, r"[\w.-]+@[\w.-]+:[^\s$#]*[$#]\s"),
    // [user@host dir]$
    ("bracketed", Strength::Strong, r"\[[\w.-]+@[\w.-]+(?:\s[^\]]*)?\][$#]\s"),
    // user@host dir %  (zsh default)
    ("zsh-user-host", Strength::Strong, r"[\w.-]+@[\w.-]+\s+\S+\s+%\s"),
    // bash-5.2$
    ("shell-version", Strength::Strong, r"(?:bash|sh|zsh|ksh|dash)-\d+(?:\.\d+)*[$#%]\s"),
    // Kali / Parrot second prompt line: └─$ , └──╼ $
    ("two-line", Strength::Strong, r"└─+(?:╼\s*)?[$#]\s"),
    // oh-my-zsh: ➜  dir git:(main) ✗
    ("oh-my-zsh", Strength::Strong, r"➜\s+\S+(?:\s+git:\([^)]*\))?(?:\s+✗)?\s+"),
    // PS C:\Users\me> , PS /home/me>
    ("powershell", Strength::Strong, r"PS (?:[A-Za-z]:\\|/)[^>]*>\s"),
    ("dollar", Strength::Loose, r"\$\s"),
    ("hash", Strength::Loose, r"#\s"),
    ("percent", Strength::Loose, r"%\s"),
    ("chevron", Strength::Loose, r"❯\s"),
    ("python-repl", Strength::Loose, r">>>\s"),
];

/// A compiled prompt shape.
#[derive(Debug, Clone)]
pub struct PromptPattern {
    pub name: String,
    pub strength: Strength,
    regex: Regex,
}

impl PromptPattern {
    pub fn new(name: impl Into<String>, strength: Strength, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            strength,
            regex: Regex::new(pattern)?,
        })
    }

    /// Byte offset where the command starts, if the line begins with this prompt.
    fn command_start(&self, line: &str) -> Option<usize> {
        self.regex
            .find(line)
            .filter(|m| m.start() == 0)
            .map(|m| m.end())
    }
}

/// A line recognized as prompt plus typed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMatch {
    /// Index of the matching pattern in its [`PromptSet`]
    pub pattern: usize,
    pub strength: Strength,
    /// Typed command, trimmed. Never empty.
    pub command: String,
}

/// Ordered collection of prompt shapes.
#[derive(Debug, Clone)]
pub struct PromptSet {
    patterns: Vec<PromptPattern>,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptSet {
    /// The built-in shapes.
    pub fn builtin() -> Self {
        let mut patterns = Vec::with_capacity(BUILTIN.len());
        for (name, strength, body) in BUILTIN {
            let anchored = if *strength == Strength::Loose && *name != "dollar" {
                format!("^{}", body)
            } else {
                format!("^{}{}", DECOR, body)
            };
            match PromptPattern::new(*name, *strength, &anchored) {
                Ok(p) => patterns.push(p),
                Err(e) => warn!("Failed to compile prompt pattern '{}': {}", name, e),
            }
        }
        Self { patterns }
    }

    /// Built-in shapes preceded by user patterns. User patterns count as
    /// strong; invalid ones are skipped with a warning.
    pub fn with_extra(extra: &[String]) -> (Self, Vec<Warning>) {
        let mut warnings = Vec::new();
        let mut patterns = Vec::new();
        for (idx, pattern) in extra.iter().enumerate() {
            match PromptPattern::new(format!("custom-{}", idx + 1), Strength::Strong, pattern) {
                Ok(p) => patterns.push(p),
                Err(e) => {
                    let reason = format!("invalid prompt pattern '{}': {}", pattern, e);
                    debug!("{}", reason);
                    warnings.push(Warning::malformed(
                        "config.toml [detector] extra_prompt_patterns",
                        idx + 1,
                        reason,
                    ));
                }
            }
        }
        patterns.extend(Self::builtin().patterns);
        (Self { patterns }, warnings)
    }

    pub fn patterns(&self) -> &[PromptPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Match one line against the set. A prompt with nothing typed after
    /// it is not a match.
    pub fn match_line(&self, line: &str) -> Option<PromptMatch> {
        self.patterns.iter().enumerate().find_map(|(idx, p)| {
            let start = p.command_start(line)?;
            let command = line[start..].trim();
            if command.is_empty() {
                return None;
            }
            Some(PromptMatch {
                pattern: idx,
                strength: p.strength,
                command: command.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(line: &str) -> Option<String> {
        PromptSet::builtin().match_line(line).map(|m| m.command)
    }

    fn strength(line: &str) -> Option<Strength> {
        PromptSet::builtin().match_line(line).map(|m| m.strength)
    }

    #[test]
    fn user_at_host() {
        assert_eq!(cmd("user@host:~/dir$ nmap 10.0.0.1").as_deref(), Some("nmap 10.0.0.1"));
        assert_eq!(strength("user@host:~/dir$ nmap 10.0.0.1"), Some(Strength::Strong));
    }

    #[test]
    fn root_prompt() {
        assert_eq!(cmd("root@box:/tmp# id").as_deref(), Some("id"));
    }

    #[test]
    fn bracketed_prompt() {
        assert_eq!(cmd("[user@host targets]$ ls -la").as_deref(), Some("ls -la"));
    }

    #[test]
    fn zsh_prompt() {
        assert_eq!(cmd("user@mac ~/work % git status").as_deref(), Some("git status"));
    }

    #[test]
    fn decorated_prompts() {
        assert_eq!(cmd("(venv) user@host:~$ pip list").as_deref(), Some("pip list"));
        assert_eq!(cmd("[1] user@host:~$ false").as_deref(), Some("false"));
        assert_eq!(cmd("(venv) $ python3 x.py").as_deref(), Some("python3 x.py"));
    }

    #[test]
    fn kali_two_line_prompt() {
        assert_eq!(cmd("└─$ sudo nmap -sS 10.0.0.1").as_deref(), Some("sudo nmap -sS 10.0.0.1"));
        assert_eq!(cmd("└─# whoami").as_deref(), Some("whoami"));
    }

    #[test]
    fn oh_my_zsh_prompt() {
        assert_eq!(cmd("➜  recon git:(main) ✗ ffuf -u x").as_deref(), Some("ffuf -u x"));
        assert_eq!(cmd("➜  recon ls").as_deref(), Some("ls"));
    }

    #[test]
    fn shell_version_and_powershell() {
        assert_eq!(cmd("bash-5.2$ echo hi").as_deref(), Some("echo hi"));
        assert_eq!(cmd(r"PS C:\Users\me> Get-Process").as_deref(), Some("Get-Process"));
    }

    #[test]
    fn bare_prompts_are_loose() {
        assert_eq!(cmd("$ whoami").as_deref(), Some("whoami"));
        assert_eq!(strength("$ whoami"), Some(Strength::Loose));
        assert_eq!(strength("# id"), Some(Strength::Loose));
        assert_eq!(strength("❯ ls"), Some(Strength::Loose));
        assert_eq!(strength(">>> import os"), Some(Strength::Loose));
    }

    #[test]
    fn prompt_without_command_is_not_a_match() {
        assert_eq!(cmd("user@host:~$"), None);
        assert_eq!(cmd("$"), None);
        assert_eq!(cmd("$    "), None);
    }

    #[test]
    fn output_is_not_a_prompt() {
        assert_eq!(cmd("Starting Nmap 7.94"), None);
        assert_eq!(cmd(""), None);
        assert_eq!(cmd("  $ indented example"), None);
        assert_eq!(cmd("Total cost: $ 5"), None);
        assert_eq!(cmd("22/tcp open  ssh     OpenSSH 8.9p1"), None);
    }

    #[test]
    fn extra_patterns_come_first() {
        let (set, warnings) = PromptSet::with_extra(&[r"^lab> ".to_string()]);
        assert!(warnings.is_empty());
        let m = set.match_line("lab> run scan").unwrap();
        assert_eq!(m.pattern, 0);
        assert_eq!(m.strength, Strength::Strong);
        assert_eq!(m.command, "run scan");
    }

    #[test]
    fn extra_patterns_must_match_at_line_start() {
        let (set, _) = PromptSet::with_extra(&["lab> ".to_string()]);
        assert!(set.match_line("the lab> thing").is_none());
    }

    #[test]
    fn invalid_extra_pattern_is_reported() {
        let (set, warnings) = PromptSet::with_extra(&["(unclosed".to_string()]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(set.len(), PromptSet::builtin().len());
    }
}
