//! oplog-backup CLI

use anyhow::Result;
use backup_core::Timestamp;
use clap::{Args, Parser, Subcommand};
use cli_lib::config::{self, Config, Overrides};
use cli_lib::logging;
use journal::{BackupMode, BackupOptions};
use std::path::PathBuf;

mod cmd;

/// Full and incremental MongoDB backups built from the oplog
#[derive(Parser)]
#[command(name = "oplog-backup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/oplog-backup/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a full or incremental backup
    Backup {
        /// auto, full or oplog
        #[arg(long, default_value = "auto")]
        mode: BackupMode,

        /// Capture from this position instead of the stored one (e.g. 1700000000:1)
        #[arg(long)]
        start: Option<Timestamp>,

        /// Skip uploading the chain to S3
        #[arg(long)]
        no_sync: bool,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Show the active chain and its position
    Status {
        /// Backup root directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Show configuration
    Config {
        /// Print the config file location
        #[arg(long)]
        path: bool,

        /// With --path, write the example file if none exists
        #[arg(long, requires = "path")]
        create: bool,

        /// Print an annotated example configuration
        #[arg(long, conflicts_with = "path")]
        example: bool,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Backup root directory
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Compress dumps
    #[arg(long)]
    gzip: bool,

    /// MongoDB host
    #[arg(long)]
    host: Option<String>,

    /// MongoDB port
    #[arg(long)]
    port: Option<u16>,
}

impl From<TargetArgs> for Overrides {
    fn from(args: TargetArgs) -> Self {
        Self {
            dir: args.dir,
            gzip: args.gzip,
            host: args.host,
            port: args.port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Printing the example or the file location must work before a file exists
    let standalone = matches!(
        cli.command,
        Commands::Config { path: true, .. } | Commands::Config { example: true, .. }
    );
    let mut config = if standalone {
        Config::default()
    } else {
        config::load(cli.config.as_deref())?
    };
    let _log_guard = logging::init(cli.verbose, config.log.dir.as_deref())?;

    match cli.command {
        Commands::Backup {
            mode,
            start,
            no_sync,
            target,
        } => {
            config.apply(&target.into());
            config.validate()?;
            cmd::backup::run(config, mode, BackupOptions { start }, no_sync).await
        }
        Commands::Status { dir } => {
            config.apply(&Overrides {
                dir,
                ..Default::default()
            });
            cmd::status::run(&config).await
        }
        Commands::Config {
            path,
            create,
            example,
        } => {
            if example {
                cmd::config::show_example().await
            } else if path {
                cmd::config::show_path(cli.config.as_deref(), create).await
            } else {
                cmd::config::show_effective(&config).await
            }
        }
    }
}
