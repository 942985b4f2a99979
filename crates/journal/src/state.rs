//! Persisted state documents
//!
//! Two JSON documents tie successive runs together:
//! - `<root>/backup.json`: which chain is active (`{"backup": "<name>"}`)
//! - `<root>/<chain>/state.json`: how far that chain has been captured
//!   (`{"position": {"seconds": S, "increment": I}}`)
//!
//! The store is pure storage. Deciding what to write is the orchestrator's job.

use crate::layout::{CHAIN_STATE_FILE, GLOBAL_STATE_FILE};
use backup_core::{BackupError, IoContext, Result, Timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Pointer to the active backup chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
}

/// Capture progress of one backup chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupState {
    /// Last oplog position confirmed captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Timestamp>,
}

impl BackupState {
    pub fn at(position: Timestamp) -> Self {
        Self {
            position: Some(position),
        }
    }

    /// State after capturing up to `position`
    ///
    /// Positions only move forward within a chain.
    pub fn advanced_to(&self, chain: &str, position: Timestamp) -> Result<Self> {
        match self.position {
            Some(current) if position < current => Err(BackupError::PositionRegression {
                chain: chain.to_string(),
                current,
                requested: position,
            }),
            _ => Ok(Self::at(position)),
        }
    }
}

/// Reads and writes the state documents under one backup root
#[derive(Debug, Clone)]
pub struct BackupStateStore {
    root: PathBuf,
}

impl BackupStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The backup root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn global_state_path(&self) -> PathBuf {
        self.root.join(GLOBAL_STATE_FILE)
    }

    /// Folder holding everything that belongs to `chain`
    pub fn chain_dir(&self, chain: &str) -> PathBuf {
        self.root.join(chain)
    }

    pub fn chain_state_path(&self, chain: &str) -> PathBuf {
        self.chain_dir(chain).join(CHAIN_STATE_FILE)
    }

    pub fn read_global(&self) -> Result<Option<GlobalState>> {
        read_document(&self.global_state_path())
    }

    pub fn write_global(&self, state: &GlobalState) -> Result<()> {
        write_document(&self.global_state_path(), state)
    }

    pub fn read_chain_state(&self, chain: &str) -> Result<Option<BackupState>> {
        read_document(&self.chain_state_path(chain))
    }

    pub fn write_chain_state(&self, chain: &str, state: &BackupState) -> Result<()> {
        write_document(&self.chain_state_path(chain), state)
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(BackupError::io(
                format!("Failed to read {}", path.display()),
                e,
            ))
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| BackupError::CorruptState {
            path: path.to_path_buf(),
            source,
        })
}

/// Replace `path` with the JSON encoding of `value`
///
/// Written to a temp file in the same directory, fsynced, then renamed over
/// the target, so readers see either the old or the new document.
fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .io_context(|| format!("Failed to create directory {}", dir.display()))?;

    let serialized = serde_json::to_vec(value).map_err(|source| BackupError::CorruptState {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .io_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(&serialized)
        .io_context(|| format!("Failed to write {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .io_context(|| format!("Failed to sync {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| BackupError::io(format!("Failed to replace {}", path.display()), e.error))?;

    Ok(())
}
