//! Common utilities for integration tests

pub mod cli;

pub use cli::BackupCommand;

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch backup root plus a config file pointing at it
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub config: PathBuf,
}

impl TestEnv {
    /// Config whose tools are guaranteed not to exist, so nothing reaches a real server
    pub fn new() -> Self {
        Self::with_config("")
    }

    /// Same as `new`, with `extra` appended to the config file
    pub fn with_config(extra: &str) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("backups");
        let config = temp_dir.path().join("config.toml");

        let contents = format!(
            r#"[backup]
dir = "{root}"

[mongo]
mongodump = "/nonexistent/mongodump"
bsondump = "/nonexistent/bsondump"
mongo = "/nonexistent/mongo"
{extra}
"#,
            root = root.display(),
            extra = extra,
        );
        fs::write(&config, contents).unwrap();

        Self {
            temp_dir,
            root,
            config,
        }
    }

    /// Command with `--config` already set
    pub fn command(&self, args: &[&str]) -> BackupCommand {
        let mut cmd = BackupCommand::new(self.temp_dir.path());
        cmd.args(&["--config", self.config.to_str().unwrap()]);
        cmd.args(args);
        cmd
    }

    /// Lay down a chain as a previous run would have left it
    pub fn seed_chain(&self, chain: &str, position: &str, segments: &[&str]) {
        let chain_dir = self.root.join(chain);
        fs::create_dir_all(&chain_dir).unwrap();
        fs::write(
            self.root.join("backup.json"),
            format!(r#"{{"backup":"{}"}}"#, chain),
        )
        .unwrap();
        fs::write(chain_dir.join("state.json"), position).unwrap();
        for segment in segments {
            fs::write(chain_dir.join(segment), vec![0u8; 64]).unwrap();
        }
    }

    /// Whether a backup still holds the root's lock
    pub fn lock_held(&self) -> bool {
        journal::BackupLock::is_held(&self.root).unwrap()
    }

    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.root.join(relative).exists()
    }
}
