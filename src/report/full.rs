//! The full session report (`session_log.md`).

use std::fmt::Write;

use super::markdown::{code_block, fence_for, heading_text, inline_code, lang_hint, table_cell};
use super::{OutputView, SessionReport, TIME_FORMAT};
use crate::blocks::CommandBlock;
use crate::config::ReportConfig;

const TOOL_MARKER: &str = "🔴";
const COMMAND_MARKER: &str = "▸";

/// Render the full report. The result only depends on the report and the
/// configuration.
pub fn render_full(report: &SessionReport, config: &ReportConfig) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_document(&mut out, report, config);
    out
}

fn write_document(out: &mut String, report: &SessionReport, config: &ReportConfig) -> std::fmt::Result {
    writeln!(out, "# Session Log")?;
    writeln!(out)?;
    writeln!(
        out,
        "> Generated by **oplogger** from {} capture source(s)",
        report.sources.len()
    )?;
    writeln!(out)?;

    write_summary(out, report)?;
    write_sources(out, report)?;

    writeln!(out, "## Commands")?;
    writeln!(out)?;
    if report.blocks.is_empty() {
        writeln!(out, "_No commands recorded._")?;
        return Ok(());
    }
    for block in &report.blocks {
        write_block(out, block, config)?;
    }
    Ok(())
}

fn write_summary(out: &mut String, report: &SessionReport) -> std::fmt::Result {
    writeln!(out, "## Summary")?;
    writeln!(out)?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|--------|-------|")?;
    writeln!(out, "| Sources | {} |", report.sources.len())?;
    writeln!(out, "| Total Commands | {} |", report.total_commands())?;
    writeln!(out, "| Tool Invocations | {} |", report.tool_invocations())?;
    writeln!(out)?;

    let counts = report.tool_counts();
    if !counts.is_empty() {
        writeln!(out, "### Tool Usage")?;
        writeln!(out)?;
        writeln!(out, "| Tool | Invocations |")?;
        writeln!(out, "|------|-------------|")?;
        for (tool, count) in counts {
            writeln!(out, "| {} | {} |", inline_code(&tool), count)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_sources(out: &mut String, report: &SessionReport) -> std::fmt::Result {
    if report.sources.is_empty() {
        return Ok(());
    }
    writeln!(out, "## Sources")?;
    writeln!(out)?;
    writeln!(out, "| Source | Started | Working Directory | Commands |")?;
    writeln!(out, "|--------|---------|-------------------|----------|")?;
    for source in &report.sources {
        let cwd = source
            .cwd()
            .map(|c| inline_code(&table_cell(c)))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            table_cell(&source.id.label()),
            source.started().unwrap_or_else(|| "-".to_string()),
            cwd,
            source.commands
        )?;
    }
    writeln!(out)?;
    writeln!(out, "---")?;
    writeln!(out)
}

fn write_block(out: &mut String, block: &CommandBlock, config: &ReportConfig) -> std::fmt::Result {
    let mut full_command = None;
    if block.has_command() {
        let marker = if block.is_security_tool {
            TOOL_MARKER
        } else {
            COMMAND_MARKER
        };
        let (heading, shortened) = heading_text(&block.command, config.max_heading_width);
        writeln!(out, "### {} {}", marker, inline_code(&heading))?;
        if shortened {
            full_command = Some(&block.command);
        }
    } else {
        writeln!(out, "### Output without command")?;
    }
    writeln!(out)?;

    let mut meta = Vec::new();
    if let Some(tool) = &block.matched_tool {
        meta.push(format!("**Tool:** {}", inline_code(tool)));
    }
    meta.push(format!("**Source:** {}", block.source.label()));
    if let Some(ts) = &block.timestamp {
        meta.push(format!("**Time:** {}", ts.format(TIME_FORMAT)));
    }
    writeln!(out, "{}", meta.join(" · "))?;
    writeln!(out)?;

    if let Some(command) = full_command {
        writeln!(out, "{}", code_block(command, "bash"))?;
    }

    let view = OutputView::new(&block.output, config.head_lines, config.tail_lines);
    if view.is_empty() {
        writeln!(out, "_No output._")?;
        writeln!(out)?;
    } else {
        write_output(out, block, &view)?;
    }
    writeln!(out, "---")?;
    writeln!(out)
}

fn write_output(out: &mut String, block: &CommandBlock, view: &OutputView<'_>) -> std::fmt::Result {
    let mut body = view.head.join("\n");
    if view.is_truncated() {
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        write!(body, "... [{} lines omitted] ...", view.omitted)?;
        if !view.tail.is_empty() {
            body.push_str("\n\n");
            body.push_str(&view.tail.join("\n"));
        }
    }

    let noun = if view.total() == 1 { "line" } else { "lines" };
    let fence = fence_for(&body);
    let lang = lang_hint(&block.command, &block.output);

    writeln!(out, "<details>")?;
    writeln!(out, "<summary>Output ({} {})</summary>", view.total(), noun)?;
    writeln!(out)?;
    writeln!(out, "{}{}", fence, lang)?;
    writeln!(out, "{}", body)?;
    writeln!(out, "{}", fence)?;
    writeln!(out)?;
    writeln!(out, "</details>")?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureMeta, SourceId};
    use crate::report::SourceSummary;

    fn source() -> SourceId {
        SourceId::new("pane_w0_p0_20250206_100000", &CaptureMeta::new())
    }

    fn block(ordinal: usize, command: &str, output: &[&str]) -> CommandBlock {
        CommandBlock {
            source: source(),
            ordinal,
            command: command.to_string(),
            output: output.iter().map(|s| s.to_string()).collect(),
            timestamp: None,
            is_security_tool: false,
            matched_tool: None,
            first_line: 0,
            line_count: 1 + output.len(),
        }
    }

    fn render(blocks: Vec<CommandBlock>) -> String {
        let sources = vec![SourceSummary {
            id: source(),
            meta: CaptureMeta::new().with("cwd", "/home/kali"),
            commands: blocks.iter().filter(|b| b.has_command()).count(),
        }];
        render_full(&SessionReport::new(sources, blocks), &ReportConfig::default())
    }

    #[test]
    fn empty_report_has_header_and_zero_counts() {
        let doc = render_full(&SessionReport::default(), &ReportConfig::default());
        assert!(doc.starts_with("# Session Log\n"));
        assert!(doc.contains("| Total Commands | 0 |"));
        assert!(doc.contains("| Tool Invocations | 0 |"));
        assert!(doc.contains("_No commands recorded._"));
        assert!(!doc.contains("### Tool Usage"));
    }

    #[test]
    fn markers_and_summary() {
        let mut scan = block(0, "nmap -sV 10.0.0.1", &["Starting Nmap", "Done"]);
        scan.is_security_tool = true;
        scan.matched_tool = Some("nmap".to_string());
        let doc = render(vec![scan, block(1, "ls", &["a.txt"])]);

        assert!(doc.contains("### 🔴 `nmap -sV 10.0.0.1`"));
        assert!(doc.contains("### ▸ `ls`"));
        assert!(doc.contains("| `nmap` | 1 |"));
        assert!(doc.contains("| Total Commands | 2 |"));
        assert!(doc.contains("| Tool Invocations | 1 |"));
        assert!(doc.contains("<summary>Output (2 lines)</summary>"));
        assert!(doc.contains("<summary>Output (1 line)</summary>"));
        assert!(doc.contains("| Window 0 / Pane 0 | 2025-02-06 10:00:00 | `/home/kali` | 2 |"));
    }

    #[test]
    fn long_output_gets_omission_marker() {
        let lines: Vec<String> = (1..=200).map(|i| format!("row {}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let doc = render(vec![block(0, "cat big.txt", &refs)]);

        assert!(doc.contains("<summary>Output (200 lines)</summary>"));
        assert!(doc.contains("row 100\n\n... [50 lines omitted] ...\n\nrow 151"));
        assert!(!doc.contains("row 101\n"));
        assert!(doc.contains("row 200"));
    }

    #[test]
    fn blank_output_renders_placeholder() {
        let doc = render(vec![block(0, "true", &["", " "])]);
        assert!(doc.contains("_No output._"));
        assert!(!doc.contains("<details>"));
    }

    #[test]
    fn leading_output_block_is_included() {
        let doc = render(vec![block(0, "", &["Welcome to Kali"]), block(1, "id", &[])]);
        assert!(doc.contains("### Output without command"));
        assert!(doc.contains("Welcome to Kali"));
        assert!(doc.contains("| Total Commands | 1 |"));
    }

    #[test]
    fn long_and_multiline_commands_shown_in_full() {
        let long = format!("echo {}", "x".repeat(200));
        let doc = render(vec![
            block(0, &long, &[]),
            block(1, "nmap \\\n-p 80 host", &[]),
        ]);
        assert!(doc.contains(&format!("```bash\n{}\n```", long)));
        assert!(doc.contains("### ▸ `nmap \\ ...`"));
        assert!(doc.contains("```bash\nnmap \\\n-p 80 host\n```"));
    }

    #[test]
    fn fences_outgrow_backticks_in_output() {
        let doc = render(vec![block(0, "cat README.md", &["```rust", "fn main() {}", "```"])]);
        assert!(doc.contains("````\n```rust\nfn main() {}\n```\n````"));
    }

    #[test]
    fn output_language_hint() {
        let doc = render(vec![block(0, "cat data", &["{\"ok\": true}"])]);
        assert!(doc.contains("```json\n{\"ok\": true}\n```"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let blocks = vec![block(0, "ls", &["a"]), block(1, "id", &["uid=0"])];
        assert_eq!(render(blocks.clone()), render(blocks));
    }
}
