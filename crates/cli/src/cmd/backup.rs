//! Run one backup invocation

use anyhow::{Context, Result};
use backup_core::{BackupError, SyncCollaborator};
use cli_lib::config::Config;
use cli_lib::util;
use journal::{
    BackupMode, BackupOptions, BackupReport, BackupStateStore, Collaborators, Orchestrator,
    ResolvedMode,
};
use owo_colors::OwoColorize;

pub async fn run(
    config: Config,
    mode: BackupMode,
    options: BackupOptions,
    no_sync: bool,
) -> Result<()> {
    let root = config.backup.dir.clone();
    let spinner = util::spinner(format!("Backing up into {}", root.display()));

    // The tools block on child processes
    let outcome = tokio::task::spawn_blocking(move || execute(&config, mode, &options, no_sync))
        .await
        .context("Backup task panicked")?;
    spinner.finish_and_clear();

    match outcome {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "Backup failed:".red().bold(), e);
            if e.breaks_chain() {
                eprintln!(
                    "  {}",
                    "This chain cannot be continued. Start a new one with 'oplog-backup backup --mode full'."
                        .yellow()
                );
            }
            Err(e).context("Backup failed")
        }
    }
}

fn execute(
    config: &Config,
    mode: BackupMode,
    options: &BackupOptions,
    no_sync: bool,
) -> std::result::Result<BackupReport, BackupError> {
    let dumper = config.mongodump();
    let reader = config.bsondump();
    let positions = config.mongo_shell();
    let uploader = if no_sync { None } else { config.s3_sync() };

    let tools = Collaborators {
        dumper: &dumper,
        reader: &reader,
        positions: &positions,
        sync: uploader.as_ref().map(|s| s as &dyn SyncCollaborator),
    };

    let orchestrator = Orchestrator::new(BackupStateStore::new(&config.backup.dir), tools);
    orchestrator.perform(mode, options)
}

fn print_report(report: &BackupReport) {
    let heading = match report.mode {
        ResolvedMode::Full => "Full backup complete",
        ResolvedMode::Oplog => "Incremental backup complete",
    };
    println!("{} {}", "✓".green(), heading.bold());
    println!("  Chain:     {}", report.chain.cyan());

    if let Some(full) = &report.full {
        println!(
            "  Anchor:    {} ({})",
            full.position.yellow(),
            util::format_position_time(full.position).dimmed()
        );
    }

    let segment = &report.segment;
    match &segment.file {
        Some(file) if !segment.empty => {
            println!(
                "  Captured:  {} new entries",
                segment.new_entries().to_string().green()
            );
            println!("  Segment:   {}", file.display());
        }
        _ => println!("  Captured:  {}", "nothing new".dimmed()),
    }
    println!(
        "  Position:  {} ({})",
        segment.position.yellow(),
        util::format_position_time(segment.position).dimmed()
    );

    if report.synced {
        println!("  Synced:    {}", "yes".green());
    } else {
        println!("  Synced:    {}", "skipped".dimmed());
    }
}
