//! Integration tests for the oplogger binary.

use std::fs;

use predicates::prelude::*;
use tempfile::TempDir;

use super::helpers::{oplogger, SessionDir};

#[test]
fn help_lists_subcommands() {
    let base = TempDir::new().unwrap();
    oplogger(base.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("stop"))
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("attach").not());
}

#[test]
fn version_flag() {
    let base = TempDir::new().unwrap();
    oplogger(base.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("oplogger "));
}

#[test]
fn parse_writes_both_documents() {
    let base = TempDir::new().unwrap();
    let session = SessionDir::new();
    session.capture(
        "pane_w0_p0_20250206_100000.log",
        "$ nmap -sV 10.0.0.1\nStarting Nmap\n$ ls\nnotes.txt\n",
    );

    oplogger(base.path())
        .arg("parse")
        .arg(session.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Parsed 2 command(s) from 1 source(s)"))
        .stdout(predicate::str::contains("session_log.md"));

    assert_eq!(
        session.read("commands_only.md"),
        "# Commands\n\n🔴 `nmap -sV 10.0.0.1`\n- `ls`\n"
    );
}

#[test]
fn parse_output_override() {
    let base = TempDir::new().unwrap();
    let session = SessionDir::new();
    session.capture("terminal_20250206_100000.log", "$ id\nuid=0\n");
    let target = base.path().join("engagement.md");

    oplogger(base.path())
        .arg("parse")
        .arg(session.path())
        .arg("-o")
        .arg(&target)
        .assert()
        .success();

    assert!(fs::read_to_string(&target).unwrap().starts_with("# Session Log"));
    assert!(!session.path().join("session_log.md").exists());
    assert!(session.path().join("commands_only.md").exists());
}

#[test]
fn parse_defaults_to_oplogs_in_cwd() {
    let base = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let logs = work.path().join("oplogs");
    fs::create_dir(&logs).unwrap();
    fs::write(logs.join("terminal_20250206_100000.log"), "$ whoami\nroot\n").unwrap();

    oplogger(base.path())
        .current_dir(work.path())
        .arg("parse")
        .assert()
        .success();

    assert!(logs.join("session_log.md").exists());
}

#[test]
fn parse_missing_directory_fails() {
    let base = TempDir::new().unwrap();
    let missing = base.path().join("nope");

    oplogger(base.path())
        .arg("parse")
        .arg(&missing)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Not found"))
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn parse_reports_malformed_tool_lines() {
    let base = TempDir::new().unwrap();
    fs::write(base.path().join("oplogger.conf"), "nmap\nnot a tool\n").unwrap();
    let session = SessionDir::new();
    session.capture("terminal_20250206_100000.log", "$ nmap x\n");

    oplogger(base.path())
        .arg("parse")
        .arg(session.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("oplogger.conf:2:"));
}

#[test]
fn status_without_session() {
    let base = TempDir::new().unwrap();
    oplogger(base.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No active session."));
}

#[test]
fn status_shows_active_session() {
    let base = TempDir::new().unwrap();
    let session = SessionDir::new();
    session.capture("pane_w0_p0_20250206_100000.log", "$ id\n");
    let state = serde_json::json!({
        "dir": session.path(),
        "type": "tmux",
        "started": "2025-02-06T10:00:00Z",
        "tmux_session": "recon",
    });
    fs::write(base.path().join("session.json"), state.to_string()).unwrap();

    oplogger(base.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("recon"))
        .stdout(predicate::str::contains("Log files"))
        .stdout(predicate::str::contains("tmux"));
}

#[test]
fn stop_without_session_fails() {
    let base = TempDir::new().unwrap();
    oplogger(base.path())
        .arg("stop")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active session"));
}

#[test]
fn start_twice_is_refused() {
    let base = TempDir::new().unwrap();
    let state = serde_json::json!({
        "dir": "/tmp/oplogs",
        "type": "plain",
        "started": "2025-02-06T10:00:00Z",
    });
    fs::write(base.path().join("session.json"), state.to_string()).unwrap();

    oplogger(base.path())
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Already logging in /tmp/oplogs"));
}

#[test]
fn start_requires_a_terminal_outside_tmux() {
    let base = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    oplogger(base.path())
        .current_dir(work.path())
        .arg("start")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stdin is not a terminal"));

    assert!(!base.path().join("session.json").exists());
    assert!(base.path().join("oplogger.conf").exists());
}

#[test]
fn config_show_prints_defaults() {
    let base = TempDir::new().unwrap();
    oplogger(base.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("head_lines = 100"))
        .stdout(predicate::str::contains("logs_dir = \"oplogs\""));
}

#[test]
fn config_tools_lists_defaults() {
    let base = TempDir::new().unwrap();
    oplogger(base.path())
        .args(["config", "tools"])
        .assert()
        .success()
        .stdout(predicate::str::contains("built-in defaults"))
        .stdout(predicate::str::contains("nmap"));
}

#[test]
fn completions_for_bash() {
    let base = TempDir::new().unwrap();
    oplogger(base.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("oplogger"));
}

#[test]
fn pipe_appends_with_timing_marker() {
    let base = TempDir::new().unwrap();
    let log = base.path().join("pane_w0_p0_20250206_100000.log");
    fs::write(&log, "header\n").unwrap();

    oplogger(base.path())
        .arg("pipe")
        .arg(&log)
        .write_stdin("$ id\nuid=0\n")
        .assert()
        .success();

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.starts_with("header\n===OPLOGGER_TS "));
    assert!(content.ends_with("$ id\nuid=0\n"));
}
