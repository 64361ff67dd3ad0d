//! Development tasks: `cargo xtask <task>`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "xtask")]
struct Args {
    #[command(subcommand)]
    task: Task,
}

#[derive(Debug, Subcommand)]
enum Task {
    /// Render the oplogger man page
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out_dir: PathBuf,
    },
}

fn man(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let cmd = oplogger::cli::Cli::command();
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;

    let path = out_dir.join("oplogger.1");
    fs::write(&path, buffer).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    match Args::parse().task {
        Task::Man { out_dir } => man(out_dir),
    }
}
