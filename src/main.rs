use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use oplogger::cli::{Cli, Commands, ConfigCommands};
use oplogger::ui;

mod commands;

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Start => commands::session::handle_start(),
        Commands::Stop => commands::session::handle_stop(),
        Commands::Status => commands::session::handle_status(),
        Commands::Parse { dir, output } => commands::session::handle_parse(dir, output),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(),
            ConfigCommands::Edit => commands::config::handle_edit(),
            ConfigCommands::Tools => commands::config::handle_tools(),
        },
        Commands::Completions { shell } => commands::handle_completions(shell),
        Commands::Pipe { file } => commands::capture::handle_pipe(&file),
        Commands::Attach { dir } => commands::capture::handle_attach(&dir),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
