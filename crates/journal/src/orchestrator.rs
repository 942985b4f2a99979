//! Backup orchestration
//!
//! One invocation runs a short pipeline:
//!
//! ```text
//! lock -> read pointer -> resolve mode -> [full] -> incremental -> sync
//! ```
//!
//! Each stage returns a `Result`, so a failure anywhere stops the run and
//! leaves whatever it created on disk for inspection. The active-chain pointer
//! is read once up front and written once, after a full backup completes.

use crate::layout::{chain_name, DEBUG_LOG_FILE, FULL_DUMP_DIR, OPLOG_WORK_PREFIX};
use crate::lock::BackupLock;
use crate::state::{BackupState, BackupStateStore, GlobalState};
use backup_core::{
    segment_file_name, validate, BackupError, DumpInvoker, DumpTarget, IoContext,
    OplogPositionSource, OplogSegmentResult, OplogTimestampReader, Result, SyncCollaborator,
    Timestamp,
};
use std::fmt;
use std::fs;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

/// Requested backup mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupMode {
    /// Incremental if a chain exists, otherwise full
    #[default]
    Auto,
    /// Start a new chain
    Full,
    /// Continue the active chain
    Oplog,
}

/// Mode after `Auto` has been decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedMode {
    Full,
    Oplog,
}

impl BackupMode {
    pub fn resolve(self, have_chain: bool) -> ResolvedMode {
        match self {
            Self::Full => ResolvedMode::Full,
            Self::Oplog => ResolvedMode::Oplog,
            Self::Auto if have_chain => ResolvedMode::Oplog,
            Self::Auto => ResolvedMode::Full,
        }
    }
}

impl FromStr for BackupMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "full" => Ok(Self::Full),
            "oplog" => Ok(Self::Oplog),
            other => Err(format!("unknown backup mode '{}' (expected auto, full or oplog)", other)),
        }
    }
}

impl fmt::Display for ResolvedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Oplog => write!(f, "oplog"),
        }
    }
}

/// Per-invocation options
#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    /// Capture from here instead of the stored position (oplog mode only)
    pub start: Option<Timestamp>,
}

/// The external tools a run drives
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub dumper: &'a dyn DumpInvoker,
    pub reader: &'a dyn OplogTimestampReader,
    pub positions: &'a dyn OplogPositionSource,
    /// `None` disables the sync stage
    pub sync: Option<&'a dyn SyncCollaborator>,
}

/// A newly started chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullBackupResult {
    pub chain: String,
    /// Anchor position, taken before the data dump started
    pub position: Timestamp,
}

/// Everything a completed run did
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub mode: ResolvedMode,
    pub chain: String,
    pub full: Option<FullBackupResult>,
    pub segment: OplogSegmentResult,
    pub synced: bool,
}

/// Drives full and incremental backups against one backup root
pub struct Orchestrator<'a> {
    store: BackupStateStore,
    tools: Collaborators<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: BackupStateStore, tools: Collaborators<'a>) -> Self {
        Self { store, tools }
    }

    pub fn store(&self) -> &BackupStateStore {
        &self.store
    }

    /// Run one backup invocation
    pub fn perform(&self, mode: BackupMode, options: &BackupOptions) -> Result<BackupReport> {
        let root = self.store.root();
        fs::create_dir_all(root)
            .io_context(|| format!("Failed to create backup directory {}", root.display()))?;

        let _lock = BackupLock::acquire(root)?;

        let mut global = self.store.read_global()?.unwrap_or_default();
        let mode = mode.resolve(global.backup.is_some());

        let (chain, full, start) = match mode {
            ResolvedMode::Full => {
                info!("Performing full backup");
                let full = self.backup_full()?;
                self.commit_chain(&mut global, &full.chain)?;
                info!(chain = %full.chain, anchor = %full.position, "Performed full backup");

                if options.start.is_some() {
                    warn!("Ignoring start position: a new chain continues from its anchor");
                }
                (full.chain.clone(), Some(full), None)
            }
            ResolvedMode::Oplog => {
                let chain = global.backup.clone().ok_or(BackupError::UnknownBackupPosition)?;
                (chain, None, options.start)
            }
        };

        info!(chain = %chain, "Performing incremental oplog backup");
        let segment = self.backup_oplog(&chain, start)?;
        match &segment.file {
            Some(file) if !segment.empty => info!(
                "Backed up {} new entries to {}",
                segment.new_entries(),
                file.display()
            ),
            _ => info!("Nothing new to backup"),
        }

        let synced = self.sync(&chain)?;

        Ok(BackupReport {
            mode,
            chain,
            full,
            segment,
            synced,
        })
    }

    /// Take a full data dump and start a new chain anchored before it
    pub fn backup_full(&self) -> Result<FullBackupResult> {
        // The anchor must predate the dump, or the chain could miss writes
        // made while the dump ran
        let anchor = self
            .tools
            .positions
            .latest_position()?
            .ok_or(BackupError::EmptyOplogAtLatestPosition)?;

        let chain = chain_name(anchor);
        let chain_dir = self.store.chain_dir(&chain);
        if chain_dir.exists() {
            return Err(BackupError::BackupFolderExists(chain_dir));
        }

        let dump_dir = chain_dir.join(FULL_DUMP_DIR);
        fs::create_dir_all(&dump_dir)
            .io_context(|| format!("Failed to create {}", dump_dir.display()))?;

        debug!(anchor = %anchor, dir = %dump_dir.display(), "Starting full dump");
        let output = self.tools.dumper.dump(DumpTarget::Full, &dump_dir)?;

        if !chain_dir.exists() {
            error!(dir = %chain_dir.display(), "Backup folder does not exist");
            return Err(BackupError::DumpToolFailure(format!(
                "backup folder {} vanished during the full dump",
                chain_dir.display()
            )));
        }

        let debug_log = chain_dir.join(DEBUG_LOG_FILE);
        fs::write(&debug_log, output)
            .io_context(|| format!("Failed to write {}", debug_log.display()))?;

        self.store
            .write_chain_state(&chain, &BackupState::at(anchor))?;

        Ok(FullBackupResult {
            chain,
            position: anchor,
        })
    }

    /// Capture oplog entries since the chain's position and append them
    ///
    /// `start` overrides the stored position for this capture only.
    pub fn backup_oplog(&self, chain: &str, start: Option<Timestamp>) -> Result<OplogSegmentResult> {
        let state = self
            .store
            .read_chain_state(chain)?
            .ok_or_else(|| BackupError::NoStateFound(chain.to_string()))?;

        let start_at = start
            .or(state.position)
            .ok_or(BackupError::NoStartPosition)?;

        let root = self.store.root();
        let work = tempfile::Builder::new()
            .prefix(OPLOG_WORK_PREFIX)
            .tempdir_in(root)
            .io_context(|| format!("Failed to create oplog work area in {}", root.display()))?;

        debug!(start = %start_at, dir = %work.path().display(), "Dumping oplog");
        self.tools
            .dumper
            .dump(DumpTarget::OplogSince(start_at), work.path())?;

        let dump_file = self.tools.dumper.oplog_dump_path(work.path());
        if !dump_file.exists() {
            return Err(BackupError::DumpToolFailure(format!(
                "expected oplog dump at {}",
                dump_file.display()
            )));
        }

        debug!("Checking timestamps");
        let timestamps = self.tools.reader.read_timestamps(&dump_file)?;
        validate(&timestamps, start_at)?;

        let mut result = OplogSegmentResult::from_timestamps(&timestamps)?;
        if !result.empty {
            let next = state.advanced_to(chain, result.position)?;

            let chain_dir = self.store.chain_dir(chain);
            fs::create_dir_all(&chain_dir)
                .io_context(|| format!("Failed to create {}", chain_dir.display()))?;

            let name = segment_file_name(result.first, result.position, self.tools.dumper.compressed());
            let target = chain_dir.join(name);
            fs::rename(&dump_file, &target).io_context(|| {
                format!("Failed to move oplog dump to {}", target.display())
            })?;

            self.store.write_chain_state(chain, &next)?;
            result.file = Some(target);
        }

        if let Err(e) = work.close() {
            warn!("Failed to remove oplog work area: {}", e);
        }

        Ok(result)
    }

    /// Upload the chain folder; `Ok(false)` when no remote is configured
    pub fn sync(&self, chain: &str) -> Result<bool> {
        let Some(sync) = self.tools.sync else {
            info!("No remote storage configured; skipping sync");
            return Ok(false);
        };

        let chain_dir = self.store.chain_dir(chain);
        info!(chain = %chain, "Syncing backup to remote storage");
        sync.upload(&chain_dir, chain).map_err(|e| match e {
            BackupError::SyncFailure(_) => e,
            other => BackupError::SyncFailure(other.to_string()),
        })?;
        info!(chain = %chain, "Sync complete");

        Ok(true)
    }

    fn commit_chain(&self, global: &mut GlobalState, chain: &str) -> Result<()> {
        global.backup = Some(chain.to_string());
        self.store.write_global(global)
    }
}
