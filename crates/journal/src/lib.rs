//! Backup chain journal and orchestration
//!
//! This crate provides:
//! - State documents tying successive runs together
//! - Backup root layout and chain naming
//! - Backup-root lock file
//! - The full / incremental / sync pipeline

pub mod layout;
pub mod lock;
pub mod orchestrator;
pub mod state;

// Re-exports
pub use layout::chain_name;
pub use lock::BackupLock;
pub use orchestrator::{
    BackupMode, BackupOptions, BackupReport, Collaborators, FullBackupResult, Orchestrator,
    ResolvedMode,
};
pub use state::{BackupState, BackupStateStore, GlobalState};
