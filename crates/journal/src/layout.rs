//! On-disk layout of a backup root
//!
//! ```text
//! <root>/
//!   backup.json              active chain pointer
//!   backup.lock              flock held for the duration of a run
//!   backup-<s>-<i>/          one folder per chain, named from its anchor
//!     state.json
//!     debug.log              raw output of the full dump
//!     dump/                  full data dump
//!     oplog-<s>:<i>-<s>:<i>.bson[.gz]
//!   oplog-dump-XXXXXX/       scratch area of a running capture
//! ```

use backup_core::Timestamp;

pub const GLOBAL_STATE_FILE: &str = "backup.json";
pub const LOCK_FILE: &str = "backup.lock";
pub const CHAIN_STATE_FILE: &str = "state.json";
pub const DEBUG_LOG_FILE: &str = "debug.log";
pub const FULL_DUMP_DIR: &str = "dump";
pub const OPLOG_WORK_PREFIX: &str = "oplog-dump-";

/// Name of the chain anchored at `anchor`
///
/// Deterministic, and distinct for distinct anchors.
pub fn chain_name(anchor: Timestamp) -> String {
    format!("backup-{}", anchor.to_slug())
}
