//! Show the active chain and how far it has been captured

use anyhow::{Context, Result};
use chrono::Utc;
use cli_lib::config::Config;
use cli_lib::util;
use journal::{BackupLock, BackupStateStore};
use owo_colors::OwoColorize;

pub async fn run(config: &Config) -> Result<()> {
    let store = BackupStateStore::new(&config.backup.dir);

    println!("{}", "Backup Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Backup root:   {}", store.root().display().to_string().cyan());

    let running = BackupLock::is_held(store.root()).context("Failed to probe the backup lock")?;
    if running {
        println!("Running:       {}", "yes (backup in progress)".yellow());
    }
    println!();

    let global = store
        .read_global()
        .context("Failed to read the active chain pointer")?
        .unwrap_or_default();

    let Some(chain) = global.backup else {
        println!("{}", "No backup chain yet".yellow());
        println!("  {}", "Tip: Start one with 'oplog-backup backup'".dimmed());
        return Ok(());
    };

    println!("Active chain:  {}", chain.cyan());

    let state = store
        .read_chain_state(&chain)
        .with_context(|| format!("Failed to read state of {}", chain))?;
    match state.and_then(|s| s.position) {
        Some(position) => {
            println!("Position:      {}", position.yellow());
            println!(
                "  Time:        {} ({})",
                util::format_position_time(position),
                util::format_position_age(position, Utc::now()).dimmed()
            );
        }
        None => println!("Position:      {}", "unknown (no state recorded)".red()),
    }

    let usage = util::chain_usage(&store.chain_dir(&chain))?;
    println!("Segments:      {}", usage.segments);
    println!("Size:          {}", util::format_size(usage.bytes));

    Ok(())
}
