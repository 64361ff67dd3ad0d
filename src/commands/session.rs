//! Session subcommands handler: start, stop, status, parse.

use std::path::PathBuf;

use anyhow::{Context, Result};
use humansize::{format_size, BINARY};

use oplogger::pipeline::ParseOutcome;
use oplogger::session::{SessionKind, SessionManager, StopOutcome};
use oplogger::ui::{self, current_theme, status_table};

fn print_outcome(outcome: &ParseOutcome) {
    for warning in &outcome.warnings {
        ui::warn(&warning.to_string());
    }
    let theme = current_theme();
    ui::info(&format!(
        "Parsed {} command(s) from {} source(s), {} security tool invocation(s)",
        outcome.commands, outcome.sources, outcome.tool_invocations
    ));
    ui::info(&format!(
        "Report: {}",
        theme.accent_text(&outcome.report_path.display().to_string())
    ));
    ui::info(&format!(
        "Commands: {}",
        theme.accent_text(&outcome.commands_path.display().to_string())
    ));
}

#[cfg(not(tarpaulin_include))]
pub fn handle_start() -> Result<()> {
    let manager = SessionManager::from_env()?;
    let cwd = std::env::current_dir().context("Cannot determine working directory")?;
    let state = manager.start(&cwd)?;
    let theme = current_theme();
    let dir = theme.accent_text(&state.dir.display().to_string());

    match state.kind {
        SessionKind::Tmux => {
            let session = state.tmux_session.as_deref().unwrap_or("?");
            ui::info(&format!(
                "Logging all panes of tmux session {} to {}",
                theme.accent_text(session),
                dir
            ));
            ui::info("New panes and windows are logged automatically. Run `oplogger stop` to finish.");
            Ok(())
        }
        SessionKind::Plain => run_plain(&manager, &state, &dir),
    }
}

#[cfg(unix)]
fn run_plain(
    manager: &SessionManager,
    state: &oplogger::session::SessionState,
    dir: &str,
) -> Result<()> {
    ui::info(&format!("Logging this shell to {}", dir));
    ui::info("Type `exit` or run `oplogger stop` to finish.");
    println!();

    let (session, outcome) = manager.run_plain(state)?;
    println!();
    ui::info(&format!(
        "Shell exited ({}), log saved to {}",
        session.exit_code,
        session.log_path.display()
    ));
    print_outcome(&outcome);
    Ok(())
}

#[cfg(not(unix))]
fn run_plain(
    _manager: &SessionManager,
    _state: &oplogger::session::SessionState,
    _dir: &str,
) -> Result<()> {
    anyhow::bail!("Plain-terminal capture needs a unix system; run oplogger inside tmux")
}

#[cfg(not(tarpaulin_include))]
pub fn handle_stop() -> Result<()> {
    let manager = SessionManager::from_env()?;
    match manager.stop()? {
        StopOutcome::HungUp { pid } => {
            ui::info(&format!(
                "Stopping shell {}. The report is generated when it exits.",
                pid
            ));
        }
        StopOutcome::Parsed { state, outcome } => {
            match state.tmux_session.as_deref() {
                Some(session) => ui::info(&format!(
                    "Stopped logging tmux session {}",
                    current_theme().accent_text(session)
                )),
                None => ui::info("Session ended"),
            }
            print_outcome(&outcome);
        }
    }
    Ok(())
}

#[cfg(not(tarpaulin_include))]
pub fn handle_status() -> Result<()> {
    let manager = SessionManager::from_env()?;
    let Some(status) = manager.status() else {
        ui::info("No active session.");
        return Ok(());
    };

    let state = &status.state;
    let mut rows = vec![
        ("Directory", state.dir.display().to_string()),
        ("Type", state.kind.as_str().to_string()),
        ("Started", state.started.to_rfc3339()),
    ];
    if let Some(session) = &state.tmux_session {
        rows.push(("tmux session", session.clone()));
    }
    if let Some(pid) = status.shell_pid {
        rows.push(("Shell PID", pid.to_string()));
    }
    rows.push((
        "Log files",
        format!(
            "{}  ({})",
            status.log_files,
            format_size(status.total_bytes, BINARY)
        ),
    ));

    print!("{}", status_table(&current_theme(), &rows));
    Ok(())
}

/// Directory `parse` reads when none is given.
fn default_dir(manager: &SessionManager) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Cannot determine working directory")?;
    Ok(manager.logs_dir(&cwd))
}

#[cfg(not(tarpaulin_include))]
pub fn handle_parse(dir: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let manager = SessionManager::from_env()?;
    let dir = match dir {
        Some(dir) => dir,
        None => default_dir(&manager)?,
    };
    let outcome = manager.parse(&dir, output.as_deref())?;
    print_outcome(&outcome);
    Ok(())
}
