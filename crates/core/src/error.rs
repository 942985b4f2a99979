//! Failure taxonomy shared by every backup stage

use crate::Timestamp;
use std::path::PathBuf;

/// Result type for backup operations
pub type Result<T> = std::result::Result<T, BackupError>;

/// Every way a backup invocation can fail
///
/// None of these are retried. The next invocation may succeed if the
/// underlying condition clears, except for `EmptyOplogAtLatestPosition` and
/// `OplogGapDetected`, which need an operator.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("cannot back up with an empty oplog: the server reported no latest position")]
    EmptyOplogAtLatestPosition,

    #[error("backup folder '{}' already exists; not performing backup", .0.display())]
    BackupFolderExists(PathBuf),

    #[error("dump tool failed: {0}")]
    DumpToolFailure(String),

    #[error("unknown backup position - cannot perform oplog backup. Have you completed a full backup?")]
    UnknownBackupPosition,

    #[error("no state found for backup '{0}'")]
    NoStateFound(String),

    #[error("no start position: pass an explicit start or complete a full backup first")]
    NoStartPosition,

    #[error("oplog segment is not strictly ordered: {previous} is followed by {next}")]
    OplogOrderingViolation { previous: Timestamp, next: Timestamp },

    #[error(
        "expected first oplog entry to be {expected} but was {}. \
         The oplog is probably too small: increase the oplog size, then start with another full backup",
        .found.map(|ts| ts.to_string()).unwrap_or_else(|| "nothing".to_string())
    )]
    OplogGapDetected {
        expected: Timestamp,
        found: Option<Timestamp>,
    },

    #[error("expected first oplog entry to be {expected} but was {found}; the oplog query returned older entries than requested")]
    OplogQueryError { expected: Timestamp, found: Timestamp },

    #[error("{tool} failed: {message}")]
    ToolFailure { tool: String, message: String },

    #[error("sync to remote storage failed: {0}")]
    SyncFailure(String),

    #[error("refusing to move backup '{chain}' position backwards from {current} to {requested}")]
    PositionRegression {
        chain: String,
        current: Timestamp,
        requested: Timestamp,
    },

    #[error("another backup is running (lock held at '{}')", .path.display())]
    Locked { path: PathBuf },

    #[error("state file '{}' is corrupt", .path.display())]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl BackupError {
    /// Wrap an I/O error with a description of what was being attempted
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True for failures that leave the current chain unusable
    pub fn breaks_chain(&self) -> bool {
        matches!(
            self,
            Self::EmptyOplogAtLatestPosition | Self::OplogGapDetected { .. }
        )
    }
}

/// Attach context to `std::io::Result`s
pub trait IoContext<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| BackupError::io(f(), e))
    }
}
