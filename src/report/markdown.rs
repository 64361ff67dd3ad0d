//! Markdown building blocks.

/// Longest run of consecutive backticks in `text`.
fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Code fence delimiter that cannot be closed by anything inside `content`.
pub fn fence_for(content: &str) -> String {
    "`".repeat((longest_backtick_run(content) + 1).max(3))
}

/// Inline code span for `text`.
pub fn inline_code(text: &str) -> String {
    let delimiter = "`".repeat(longest_backtick_run(text) + 1);
    if text.starts_with('`') || text.ends_with('`') {
        format!("{} {} {}", delimiter, text, delimiter)
    } else {
        format!("{}{}{}", delimiter, text, delimiter)
    }
}

/// Fenced code block with an optional language.
pub fn code_block(content: &str, lang: &str) -> String {
    let fence = fence_for(content);
    format!("{}{}\n{}\n{}\n", fence, lang, content, fence)
}

/// Language hint for a command's output code block.
pub fn lang_hint(command: &str, output: &[String]) -> &'static str {
    let first = output
        .iter()
        .map(|l| l.trim_start())
        .find(|l| !l.is_empty())
        .unwrap_or("");
    if first.starts_with('{') || first.starts_with('[') {
        return "json";
    }
    if first.starts_with('<') {
        return "xml";
    }

    let program = command
        .split_whitespace()
        .find(|w| !matches!(*w, "sudo" | "time" | "env"))
        .map(|w| w.rsplit('/').next().unwrap_or(w))
        .unwrap_or("");
    match program {
        "curl" => "http",
        "python" | "python3" => "python",
        "jq" => "json",
        _ => "",
    }
}

/// Single-line heading text for a command: the first line, cut at
/// `max_width` characters. Returns the text and whether it was shortened.
pub fn heading_text(command: &str, max_width: usize) -> (String, bool) {
    let first = command.lines().next().unwrap_or("");
    let multiline = command.contains('\n');
    let width = first.chars().count();

    if width > max_width {
        let keep = max_width.saturating_sub(3).max(1);
        let cut: String = first.chars().take(keep).collect();
        (format!("{}...", cut.trim_end()), true)
    } else if multiline {
        (format!("{} ...", first.trim_end()), true)
    } else {
        (first.to_string(), false)
    }
}

/// Escape a value for use inside a table cell.
pub fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
