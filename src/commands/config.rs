//! Config subcommands handler

use anyhow::{Context, Result};

use oplogger::config::{Config, ToolSet};
use oplogger::ui::{self, current_theme};

/// Show current configuration as TOML.
#[cfg(not(tarpaulin_include))]
pub fn handle_show() -> Result<()> {
    let config = Config::load()?;
    let toml_str = toml::to_string_pretty(&config)?;
    let theme = current_theme();
    println!("{}", theme.primary_text(&toml_str));
    Ok(())
}

/// Open configuration file in the default editor.
///
/// Uses $EDITOR environment variable (defaults to 'vi').
#[cfg(not(tarpaulin_include))]
pub fn handle_edit() -> Result<()> {
    let config_path = Config::config_path()?;
    let theme = current_theme();

    if !config_path.exists() {
        Config::default().save()?;
    }

    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "vi".to_string());

    println!(
        "{}",
        theme.primary_text(&format!(
            "Opening {} with {}",
            config_path.display(),
            editor
        ))
    );

    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()
        .with_context(|| format!("Failed to open editor '{}'", editor))?;

    Ok(())
}

/// List the effective tool set in configured order.
#[cfg(not(tarpaulin_include))]
pub fn handle_tools() -> Result<()> {
    let path = Config::tools_path()?;
    let (tools, warnings) =
        ToolSet::load(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let theme = current_theme();

    let origin = if path.exists() {
        path.display().to_string()
    } else {
        "built-in defaults".to_string()
    };
    println!(
        "{}",
        theme.secondary_text(&format!("{} tools from {}", tools.len(), origin))
    );
    for name in tools.names() {
        println!("  {}", theme.primary_text(name));
    }
    for warning in &warnings {
        ui::warn(&warning.to_string());
    }
    Ok(())
}
