//! The condensed command list (`commands_only.md`).

use super::markdown::{code_block, inline_code};
use super::SessionReport;

/// Render every command in merge order. Tool invocations are marked with
/// `🔴`, other commands with `-`. Multi-line commands follow their marker
/// line as an indented `bash` block.
pub fn render_commands(report: &SessionReport) -> String {
    let mut out = String::from("# Commands\n\n");

    for block in report.commands() {
        let marker = if block.is_security_tool { "🔴" } else { "-" };
        match block.command.split_once('\n') {
            None => {
                out.push_str(&format!("{} {}\n", marker, inline_code(&block.command)));
            }
            Some((first, _)) => {
                out.push_str(&format!("{} {} ...\n", marker, inline_code(first.trim_end())));
                out.push('\n');
                for line in code_block(&block.command, "bash").lines() {
                    out.push_str("  ");
                    out.push_str(line);
                    out.push('\n');
                }
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::CommandBlock;
    use crate::capture::{CaptureMeta, SourceId};

    fn block(ordinal: usize, command: &str, tool: Option<&str>) -> CommandBlock {
        CommandBlock {
            source: SourceId::new("terminal_20250206_100000", &CaptureMeta::new()),
            ordinal,
            command: command.to_string(),
            output: vec!["out".to_string()],
            timestamp: None,
            is_security_tool: tool.is_some(),
            matched_tool: tool.map(str::to_string),
            first_line: 0,
            line_count: 2,
        }
    }

    #[test]
    fn lists_commands_with_markers() {
        let report = SessionReport::new(
            Vec::new(),
            vec![
                block(0, "", None),
                block(1, "nmap -sV 10.0.0.1", Some("nmap")),
                block(2, "ls", None),
            ],
        );
        assert_eq!(
            render_commands(&report),
            "# Commands\n\n🔴 `nmap -sV 10.0.0.1`\n- `ls`\n"
        );
    }

    #[test]
    fn empty_report_has_only_title() {
        assert_eq!(render_commands(&SessionReport::default()), "# Commands\n\n");
    }

    #[test]
    fn multiline_command_gets_fenced_block() {
        let report = SessionReport::new(Vec::new(), vec![block(0, "cat <<EOF\nhi\nEOF", None)]);
        assert_eq!(
            render_commands(&report),
            "# Commands\n\n- `cat <<EOF` ...\n\n  ```bash\n  cat <<EOF\n  hi\n  EOF\n  ```\n\n"
        );
    }

    #[test]
    fn output_never_appears() {
        let report = SessionReport::new(Vec::new(), vec![block(0, "id", None)]);
        assert!(!render_commands(&report).contains("out"));
    }
}
