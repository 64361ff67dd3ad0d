//! Hidden subcommands run by tmux.

use std::path::Path;

use anyhow::{Context, Result};

use oplogger::capture::pipe::pipe_to_file;
use oplogger::session::attach_new_pane;

/// `oplogger pipe <FILE>`: append stdin to a capture file.
#[cfg(not(tarpaulin_include))]
pub fn handle_pipe(file: &Path) -> Result<()> {
    let stdin = std::io::stdin();
    pipe_to_file(stdin.lock(), file)
        .with_context(|| format!("Failed to append to {}", file.display()))
}

/// `oplogger attach --dir <DIR>`: start logging a newly created pane.
#[cfg(not(tarpaulin_include))]
pub fn handle_attach(dir: &Path) -> Result<()> {
    let path = attach_new_pane(dir)?;
    tracing::debug!("Attached new pane to {}", path.display());
    Ok(())
}
