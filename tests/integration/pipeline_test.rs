//! End-to-end parse runs over capture directories.

use chrono::{DateTime, FixedOffset, TimeZone};
use oplogger::capture::pipe::TimingWriter;
use oplogger::{parse_session, Config, ParseError, SessionParser, ToolSet};

use super::helpers::{pane_header, ts, SessionDir};

fn parse(session: &SessionDir) -> oplogger::ParseOutcome {
    parse_session(session.path(), &Config::default(), &ToolSet::default()).expect("parse failed")
}

#[test]
fn nmap_then_ls() {
    let session = SessionDir::new();
    session.capture(
        "pane_w0_p0_20250206_100000.log",
        "$ nmap -sV 10.0.0.1\nStarting Nmap 7.94\n22/tcp open ssh\n$ ls\nnotes.txt\n",
    );

    let outcome = parse(&session);
    assert_eq!(outcome.commands, 2);
    assert_eq!(outcome.tool_invocations, 1);

    let report = session.read("session_log.md");
    assert!(report.contains("### 🔴 `nmap -sV 10.0.0.1`"));
    assert!(report.contains("### ▸ `ls`"));
    assert!(report.contains("| `nmap` | 1 |"));
    assert!(report.contains("<summary>Output (2 lines)</summary>"));
    assert!(report.contains("**Tool:** `nmap`"));

    assert_eq!(
        session.read("commands_only.md"),
        "# Commands\n\n🔴 `nmap -sV 10.0.0.1`\n- `ls`\n"
    );
}

#[test]
fn panes_merge_by_time() {
    let session = SessionDir::new();
    session.capture(
        "pane_w0_p0_20250206_100000.log",
        &format!(
            "{}{}$ nmap 10.0.0.1\nHost is up\n",
            pane_header(0, 0, "2025-02-06T10:00:00+00:00", "/root"),
            ts("10:00:05")
        ),
    );
    session.capture(
        "pane_w0_p1_20250206_100000.log",
        &format!(
            "{}{}$ whoami\nroot\n{}$ id\nuid=0(root)\n",
            pane_header(0, 1, "2025-02-06T10:00:01+00:00", "/tmp"),
            ts("10:00:02"),
            ts("10:00:09")
        ),
    );

    parse(&session);
    assert_eq!(
        session.read("commands_only.md"),
        "# Commands\n\n- `whoami`\n🔴 `nmap 10.0.0.1`\n- `id`\n"
    );

    let report = session.read("session_log.md");
    assert!(report.contains("| Window 0 / Pane 0 | 2025-02-06 10:00:00 | `/root` | 1 |"));
    assert!(report.contains("| Window 0 / Pane 1 | 2025-02-06 10:00:01 | `/tmp` | 2 |"));
    assert!(report.contains("**Source:** Window 0 / Pane 1 · **Time:** 2025-02-06 10:00:02"));
}

fn at(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2025, 2, 6, h, m, s)
        .unwrap()
}

#[test]
fn idle_prompt_does_not_date_the_command() {
    let session = SessionDir::new();

    let mut a = TimingWriter::new(pane_header(0, 0, "2025-02-06T10:00:00+00:00", "/root").into_bytes());
    a.write_chunk(b"$ ", &at(10, 0, 0)).unwrap();
    a.write_chunk(b"nmap 10.0.0.1\r\n", &at(10, 5, 0)).unwrap();
    a.write_chunk(b"Host is up\r\n", &at(10, 5, 1)).unwrap();
    a.finish(&at(10, 5, 1)).unwrap();
    session.capture(
        "pane_w0_p0_20250206_100000.log",
        &String::from_utf8(a.into_inner()).unwrap(),
    );

    let mut b = TimingWriter::new(pane_header(0, 1, "2025-02-06T10:00:00+00:00", "/tmp").into_bytes());
    b.write_chunk(b"$ id\r\nuid=0(root)\r\n", &at(10, 2, 0)).unwrap();
    b.finish(&at(10, 2, 0)).unwrap();
    session.capture(
        "pane_w0_p1_20250206_100000.log",
        &String::from_utf8(b.into_inner()).unwrap(),
    );

    parse(&session);
    assert_eq!(
        session.read("commands_only.md"),
        "# Commands\n\n- `id`\n🔴 `nmap 10.0.0.1`\n"
    );
    assert!(session
        .read("session_log.md")
        .contains("**Source:** Window 0 / Pane 0 · **Time:** 2025-02-06 10:05:00"));
}

#[test]
fn reruns_are_byte_identical() {
    let session = SessionDir::new();
    session.capture(
        "pane_w0_p0_20250206_100000.log",
        "$ gobuster dir -u http://10.0.0.1\n/admin (Status: 301)\n",
    );
    session.capture("pane_w1_p0_20250206_100500.log", "$ cat notes\nfoo\n");

    parse(&session);
    let first = (session.read("session_log.md"), session.read("commands_only.md"));
    parse(&session);
    let second = (session.read("session_log.md"), session.read("commands_only.md"));
    assert_eq!(first, second);
}

#[test]
fn long_output_is_truncated() {
    let session = SessionDir::new();
    let mut content = String::from("$ seq 200\n");
    for i in 1..=200 {
        content.push_str(&format!("line {}\n", i));
    }
    session.capture("terminal_20250206_100000.log", &content);

    parse(&session);
    let report = session.read("session_log.md");
    assert!(report.contains("<summary>Output (200 lines)</summary>"));
    assert!(report.contains("line 100\n\n... [50 lines omitted] ...\n\nline 151\n"));
    assert!(!report.contains("line 101\n"));
    assert!(!report.contains("line 150\n"));
    assert!(report.contains("line 200\n"));
}

#[test]
fn short_output_is_kept_whole() {
    let session = SessionDir::new();
    let mut content = String::from("$ seq 80\n");
    for i in 1..=80 {
        content.push_str(&format!("line {}\n", i));
    }
    session.capture("terminal_20250206_100000.log", &content);

    parse(&session);
    let report = session.read("session_log.md");
    assert!(!report.contains("omitted"));
    assert!(report.contains("line 1\nline 2\n"));
    assert!(report.contains("line 80\n"));
}

#[test]
fn empty_capture_gives_header_only_report() {
    let session = SessionDir::new();
    session.capture("terminal_20250206_100000.log", "");

    let outcome = parse(&session);
    assert_eq!(outcome.commands, 0);
    assert!(outcome.warnings.is_empty());

    let report = session.read("session_log.md");
    assert!(report.contains("| Total Commands | 0 |"));
    assert!(report.contains("_No commands recorded._"));
    assert!(!report.contains("### Tool Usage"));
    assert_eq!(session.read("commands_only.md"), "# Commands\n\n");
}

#[test]
fn output_before_first_prompt() {
    let session = SessionDir::new();
    session.capture(
        "terminal_20250206_100000.log",
        "Last login: Thu Feb  6 09:59:00 2025\n$ id\nuid=0(root)\n",
    );

    parse(&session);
    let report = session.read("session_log.md");
    assert!(report.contains("### Output without command"));
    assert!(report.contains("Last login"));
    assert_eq!(session.read("commands_only.md"), "# Commands\n\n- `id`\n");
}

#[test]
fn terminal_control_sequences_are_rendered() {
    let session = SessionDir::new();
    session.capture(
        "terminal_20250206_100000.log",
        "\x1b[?2004h\x1b[1;32mkali@kali\x1b[0m:\x1b[1;34m~\x1b[0m$ nmpa\x08\x08ap -p- 10.0.0.1\r\n\
         \x1b[?2004lStarting Nmap\r\n\
         progress 10%\rprogress 100%\r\n",
    );

    parse(&session);
    let commands = session.read("commands_only.md");
    assert_eq!(commands, "# Commands\n\n🔴 `nmap -p- 10.0.0.1`\n");

    let report = session.read("session_log.md");
    assert!(report.contains("progress 100%"));
    assert!(!report.contains("progress 10%\n"));
    assert!(!report.contains('\x1b'));
}

#[test]
fn tool_name_inside_word_is_not_flagged() {
    let session = SessionDir::new();
    session.capture(
        "terminal_20250206_100000.log",
        "$ ./unmap_device --all\ndone\n$ ls /usr/share/nmap\nscripts\n",
    );

    let outcome = parse(&session);
    assert_eq!(outcome.commands, 2);
    assert_eq!(outcome.tool_invocations, 0);
    assert!(!session.read("commands_only.md").contains('🔴'));
}

#[test]
fn multiline_command_in_both_documents() {
    let session = SessionDir::new();
    session.capture(
        "terminal_20250206_100000.log",
        "$ for h in 1 2; do \\\n> ping -c1 10.0.0.$h; done\nPING 10.0.0.1\n",
    );

    parse(&session);
    let commands = session.read("commands_only.md");
    assert!(commands.contains("- `for h in 1 2; do \\` ...\n"));
    assert!(commands.contains("  ```bash\n  for h in 1 2; do \\\n  ping -c1 10.0.0.$h; done\n  ```\n"));
}

#[test]
fn custom_tool_list() {
    let session = SessionDir::new();
    session.capture("terminal_20250206_100000.log", "$ mytool --scan\nok\n$ nmap x\n");

    let (tools, warnings) = ToolSet::parse("# mine\nmytool\n", "oplogger.conf");
    assert!(warnings.is_empty());
    let outcome = parse_session(session.path(), &Config::default(), &tools).unwrap();
    assert_eq!(outcome.tool_invocations, 1);
    assert_eq!(
        session.read("commands_only.md"),
        "# Commands\n\n🔴 `mytool --scan`\n- `nmap x`\n"
    );
}

#[test]
fn configured_head_and_tail() {
    let session = SessionDir::new();
    let mut content = String::from("$ seq 10\n");
    for i in 1..=10 {
        content.push_str(&format!("n{}\n", i));
    }
    session.capture("terminal_20250206_100000.log", &content);

    let mut config = Config::default();
    config.report.head_lines = 2;
    config.report.tail_lines = 1;
    let tools = ToolSet::default();
    SessionParser::new(&config, &tools).run(session.path()).unwrap();

    let report = session.read("session_log.md");
    assert!(report.contains("n1\nn2\n\n... [7 lines omitted] ...\n\nn10\n"));
}

#[test]
fn oversized_head_setting_keeps_whole_output() {
    let session = SessionDir::new();
    session.capture("terminal_20250206_100000.log", "$ seq 3\n1\n2\n3\n");

    let mut config = Config::default();
    config.report.head_lines = usize::MAX;
    config.report.tail_lines = 1;
    let tools = ToolSet::default();
    SessionParser::new(&config, &tools).run(session.path()).unwrap();

    let report = session.read("session_log.md");
    assert!(report.contains("1\n2\n3\n"));
    assert!(!report.contains("omitted"));
}

#[test]
fn directory_without_logs_writes_nothing() {
    let session = SessionDir::new();
    session.capture("readme.txt", "nothing here");

    let err = parse_session(session.path(), &Config::default(), &ToolSet::default()).unwrap_err();
    assert!(matches!(err, ParseError::NoCaptures { .. }));
    assert!(!session.path().join("session_log.md").exists());
    assert!(!session.path().join("commands_only.md").exists());
}
