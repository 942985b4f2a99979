//! Captured oplog segments

use crate::{BackupError, Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one incremental capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OplogSegmentResult {
    /// Number of entries captured, including the boundary entry
    pub entries: usize,
    /// First captured entry (equal to the chain's previous position)
    pub first: Timestamp,
    /// Last captured entry, the chain's new position
    pub position: Timestamp,
    /// Only the boundary entry came back: nothing new since the last capture
    pub empty: bool,
    /// Final location of the segment file; `None` when `empty`
    pub file: Option<PathBuf>,
}

impl OplogSegmentResult {
    /// Summarise a validated, non-empty timestamp sequence
    pub fn from_timestamps(timestamps: &[Timestamp]) -> Result<Self> {
        match (timestamps.first(), timestamps.last()) {
            (Some(&first), Some(&position)) => Ok(Self {
                entries: timestamps.len(),
                first,
                position,
                empty: timestamps.len() == 1,
                file: None,
            }),
            _ => Err(BackupError::DumpToolFailure(
                "oplog dump contained no entries".to_string(),
            )),
        }
    }

    /// Entries captured beyond the boundary entry
    pub fn new_entries(&self) -> usize {
        self.entries.saturating_sub(1)
    }
}

/// File name for a segment covering `first..=last`
///
/// `oplog-<t1>:<i1>-<t2>:<i2>.bson`, with `.gz` appended for compressed dumps.
pub fn segment_file_name(first: Timestamp, last: Timestamp, compressed: bool) -> String {
    let mut name = format!("oplog-{}-{}.bson", first, last);
    if compressed {
        name.push_str(".gz");
    }
    name
}

/// True if `name` looks like a file produced by [`segment_file_name`]
pub fn is_segment_file_name(name: &str) -> bool {
    name.starts_with("oplog-") && (name.ends_with(".bson") || name.ends_with(".bson.gz"))
}
