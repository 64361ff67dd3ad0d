//! Command-line interface definition.
//!
//! Lives in the library so `xtask` can render the man page from it.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Version string with build date, plus the git SHA on dev builds.
#[cfg(not(feature = "release"))]
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("OPLOGGER_BUILD_DATE"),
    ")"
);

#[cfg(feature = "release")]
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("OPLOGGER_BUILD_DATE"),
    ")"
);

/// Terminal session logger for pentesters.
///
/// Captures every tmux pane (or a plain shell) while you work and turns
/// the raw logs into a Markdown report with security tools highlighted.
#[derive(Debug, Parser)]
#[command(name = "oplogger", version, long_version = LONG_VERSION)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start logging the current terminal or all tmux panes
    Start,

    /// Stop logging and generate the Markdown report
    Stop,

    /// Show the active session
    Status,

    /// Re-generate the report from existing raw logs
    Parse {
        /// Directory with the capture files [default: ./oplogs]
        dir: Option<PathBuf>,

        /// Write the full report here instead of into DIR
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show or edit the configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Append stdin to a capture file (run by tmux pipe-pane)
    #[command(hide = true)]
    Pipe { file: PathBuf },

    /// Attach the active tmux pane (run by tmux hooks)
    #[command(hide = true)]
    Attach {
        #[arg(long)]
        dir: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective config.toml
    Show,
    /// Open config.toml in $EDITOR
    Edit,
    /// List the highlighted tools
    Tools,
}
