//! Core types for oplog-backed backup chains
//!
//! This crate provides:
//! - Oplog positions (`Timestamp`)
//! - The segment continuity check
//! - The failure taxonomy shared by every stage
//! - Traits for the external dump, read and sync tools

pub mod collaborators;
pub mod error;
pub mod segment;
pub mod timestamp;
pub mod validate;

// Re-exports
pub use collaborators::{
    DumpInvoker, DumpTarget, OplogPositionSource, OplogTimestampReader, SyncCollaborator,
};
pub use error::{BackupError, IoContext, Result};
pub use segment::{is_segment_file_name, segment_file_name, OplogSegmentResult};
pub use timestamp::{ParseTimestampError, Timestamp};
pub use validate::validate;
