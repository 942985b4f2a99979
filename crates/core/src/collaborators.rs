//! Seams to the external tools a backup run drives
//!
//! The orchestrator only talks to these traits. The `tools` crate provides
//! process-backed implementations; tests provide in-memory ones.

use crate::{Result, Timestamp};
use std::path::{Path, PathBuf};

/// What a dump invocation should capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpTarget {
    /// Every database on the server
    Full,
    /// Entries of the operation-log collection with `ts >= start`
    OplogSince(Timestamp),
}

/// Runs the external dump tool
pub trait DumpInvoker {
    /// Dump `target` into `out_dir`, blocking until the tool exits
    ///
    /// Returns the tool's raw console output.
    fn dump(&self, target: DumpTarget, out_dir: &Path) -> Result<String>;

    /// Whether dumps are written compressed
    fn compressed(&self) -> bool;

    /// Where an oplog dump into `out_dir` leaves its data file
    fn oplog_dump_path(&self, out_dir: &Path) -> PathBuf {
        let mut path = out_dir.join("local").join("oplog.rs.bson");
        if self.compressed() {
            path.set_extension("bson.gz");
        }
        path
    }
}

/// Extracts entry timestamps from a captured oplog dump
pub trait OplogTimestampReader {
    /// Timestamps in the order they appear in `file`
    fn read_timestamps(&self, file: &Path) -> Result<Vec<Timestamp>>;
}

/// Reports the newest position in the data store's oplog
pub trait OplogPositionSource {
    /// `None` when the oplog has no entries
    fn latest_position(&self) -> Result<Option<Timestamp>>;
}

/// Uploads a chain folder to remote storage
pub trait SyncCollaborator {
    /// Mirror `local_dir` under the remote name `chain`
    fn upload(&self, local_dir: &Path, chain: &str) -> Result<()>;
}
