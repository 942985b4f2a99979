//! Inspect or create the configuration file

use anyhow::{Context, Result};
use cli_lib::config::{self, Config};
use owo_colors::OwoColorize;
use std::path::Path;

/// `config --path [--create]`: where the file lives
pub async fn show_path(explicit: Option<&Path>, create: bool) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config::config_file_path().context("Could not determine config directory")?,
    };

    if create {
        if config::init_if_missing(&path)? {
            println!("{} Created {}", "✓".green(), path.display());
        } else {
            println!("{} already exists", path.display());
        }
        return Ok(());
    }

    println!("{}", path.display());
    if !path.exists() {
        println!("  {}", "(not created yet; use --create)".dimmed());
    }
    Ok(())
}

/// `config --example`: annotated template on stdout
pub async fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// `config`: effective settings after defaults and the file, secrets masked
pub async fn show_effective(config: &Config) -> Result<()> {
    print!("{}", config.to_display_toml()?);
    Ok(())
}
