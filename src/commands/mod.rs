//! Subcommand handlers of the `oplogger` binary.

pub mod capture;
pub mod config;
pub mod session;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

use oplogger::cli::Cli;

/// Print completions for `shell` to stdout.
#[cfg(not(tarpaulin_include))]
pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
