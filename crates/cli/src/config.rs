//! Configuration file handling
//!
//! Settings live in a TOML file, by default
//! `<config dir>/oplog-backup/config.toml`. Every key is optional; command
//! line flags override whatever the file says.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tools::{Bsondump, MongoConnection, MongoShell, Mongodump, S3Sync, S3Target};

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backup: BackupSection,
    pub mongo: MongoSection,
    pub s3: S3Section,
    pub log: LogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSection {
    /// Backup root holding the pointer file and all chain folders
    pub dir: PathBuf,
    /// Compress dumps (`--gzip`, `.gz` segment names)
    pub gzip: bool,
}

impl Default for BackupSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("backup"),
            gzip: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoSection {
    #[serde(flatten)]
    pub connection: MongoConnection,
    pub mongodump: PathBuf,
    pub bsondump: PathBuf,
    pub mongo: PathBuf,
}

impl Default for MongoSection {
    fn default() -> Self {
        Self {
            connection: MongoConnection::default(),
            mongodump: PathBuf::from("mongodump"),
            bsondump: PathBuf::from("bsondump"),
            mongo: PathBuf::from("mongo"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Section {
    #[serde(flatten)]
    pub target: S3Target,
    /// AWS CLI executable
    pub aws: PathBuf,
}

impl Default for S3Section {
    fn default() -> Self {
        Self {
            target: S3Target::default(),
            aws: PathBuf::from("aws"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Also write logs to a daily rolling file in this directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dir: Option<PathBuf>,
    pub gzip: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Config {
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(dir) = &overrides.dir {
            self.backup.dir = dir.clone();
        }
        if overrides.gzip {
            self.backup.gzip = true;
        }
        if let Some(host) = &overrides.host {
            self.mongo.connection.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.mongo.connection.port = port;
        }
    }

    /// Reject combinations that would only fail later, mid-backup
    pub fn validate(&self) -> Result<()> {
        if self.backup.dir.as_os_str().is_empty() {
            anyhow::bail!("backup.dir must not be empty");
        }
        if self.mongo.connection.port == 0 {
            anyhow::bail!("mongo.port must be between 1 and 65535");
        }
        if self.mongo.connection.username.is_some() && self.mongo.connection.password.is_none() {
            anyhow::bail!("mongo.username is set but mongo.password is missing");
        }
        if self.sync_enabled() && self.s3.target.region.is_none() {
            anyhow::bail!("s3.region is required when s3.bucket is set");
        }
        Ok(())
    }

    /// Sync runs only when a bucket is configured
    pub fn sync_enabled(&self) -> bool {
        !self.s3.target.bucket.is_empty()
    }

    pub fn mongodump(&self) -> Mongodump {
        Mongodump::new(
            &self.mongo.mongodump,
            self.mongo.connection.clone(),
            self.backup.gzip,
        )
    }

    pub fn bsondump(&self) -> Bsondump {
        Bsondump::new(&self.mongo.bsondump)
    }

    pub fn mongo_shell(&self) -> MongoShell {
        MongoShell::new(&self.mongo.mongo, self.mongo.connection.clone())
    }

    pub fn s3_sync(&self) -> Option<S3Sync> {
        self.sync_enabled()
            .then(|| S3Sync::new(&self.s3.aws, self.s3.target.clone()))
    }

    /// TOML rendering with secrets masked
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.mongo.connection.password.is_some() {
            shown.mongo.connection.password = Some("********".to_string());
        }
        if shown.s3.target.secret_access_key.is_some() {
            shown.s3.target.secret_access_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).context("Failed to render configuration")
    }
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("oplog-backup").join("config.toml"))
}

/// Load configuration
///
/// An explicit `path` must exist. The default location may be absent, in
/// which case defaults are used.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => match config_file_path() {
            Some(path) => (path, false),
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        if required {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Write the example configuration to `path` unless something is already there
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, example_config())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Annotated example configuration
pub fn example_config() -> &'static str {
    r#"# oplog-backup configuration

[backup]
# Backup root: holds backup.json and one folder per backup chain
dir = "/var/backups/mongo"
# Compress dumps with gzip
gzip = true

[mongo]
host = "localhost"
port = 27017
# username = "backup"
# password = "secret"
# authentication_database = "admin"
ssl = false
# Tool locations, if not on PATH
mongodump = "mongodump"
bsondump = "bsondump"
mongo = "mongo"

[s3]
# Leave bucket empty to keep backups local only
bucket = ""
# region = "eu-west-1"
prefix = "backups"
# access_key_id = "AKIA..."
# secret_access_key = "..."
aws = "aws"

[log]
# dir = "/var/log/oplog-backup"
"#
}
