//! Terminal output styling for the CLI.
//!
//! Status lines are prefixed with `✓` (info), `!` (warning) or `✗`
//! (error). Colors are plain ANSI escapes and are left out entirely when
//! `NO_COLOR` is set or the stream is not a terminal.

use std::env;

/// Standard ANSI colors used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Cyan,
    Gray,
    DarkGray,
}

/// ANSI reset sequence
const ANSI_RESET: &str = "\x1b[0m";

fn color_to_ansi(color: Color) -> &'static str {
    match color {
        Color::Red => "\x1b[31m",
        Color::Green => "\x1b[32m",
        Color::Yellow => "\x1b[33m",
        Color::Cyan => "\x1b[36m",
        Color::Gray => "\x1b[37m",
        Color::DarkGray => "\x1b[90m",
    }
}

/// Colors for the different kinds of CLI output.
#[derive(Debug, Clone)]
pub struct Theme {
    pub text_primary: Color,
    pub text_secondary: Color,
    /// Paths, session names and other highlighted values
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    /// Emit escape codes at all
    pub enabled: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text_primary: Color::Gray,
            text_secondary: Color::DarkGray,
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            enabled: true,
        }
    }
}

impl Theme {
    /// Theme without any escape codes.
    pub fn plain() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    fn paint(&self, color: Color, text: &str) -> String {
        if self.enabled {
            format!("{}{}{}", color_to_ansi(color), text, ANSI_RESET)
        } else {
            text.to_string()
        }
    }

    pub fn primary_text(&self, text: &str) -> String {
        self.paint(self.text_primary, text)
    }

    pub fn secondary_text(&self, text: &str) -> String {
        self.paint(self.text_secondary, text)
    }

    pub fn accent_text(&self, text: &str) -> String {
        self.paint(self.accent, text)
    }

    pub fn success_text(&self, text: &str) -> String {
        self.paint(self.success, text)
    }

    pub fn warning_text(&self, text: &str) -> String {
        self.paint(self.warning, text)
    }

    pub fn error_text(&self, text: &str) -> String {
        self.paint(self.error, text)
    }

    /// `✓ message`
    pub fn info_line(&self, message: &str) -> String {
        format!("{} {}", self.success_text("✓"), message)
    }

    /// `! message`
    pub fn warn_line(&self, message: &str) -> String {
        format!("{} {}", self.warning_text("!"), message)
    }

    /// `✗ message`
    pub fn error_line(&self, message: &str) -> String {
        format!("{} {}", self.error_text("✗"), message)
    }
}

/// Theme for stdout, honouring `NO_COLOR`.
pub fn current_theme() -> Theme {
    theme_for(atty::is(atty::Stream::Stdout))
}

/// Theme for stderr, honouring `NO_COLOR`.
pub fn stderr_theme() -> Theme {
    theme_for(atty::is(atty::Stream::Stderr))
}

fn theme_for(is_tty: bool) -> Theme {
    let no_color = env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    if no_color || !is_tty {
        Theme::plain()
    } else {
        Theme::default()
    }
}

pub fn info(message: &str) {
    println!("{}", current_theme().info_line(message));
}

pub fn warn(message: &str) {
    eprintln!("{}", stderr_theme().warn_line(message));
}

pub fn error(message: &str) {
    eprintln!("{}", stderr_theme().error_line(message));
}

/// Render aligned `label  value` rows.
pub fn status_table(theme: &Theme, rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (label, value) in rows {
        let pad = " ".repeat(width - label.chars().count());
        out.push_str(&format!(
            "  {}{}  {}\n",
            theme.secondary_text(label),
            pad,
            theme.primary_text(value)
        ));
    }
    out
}
