//! In-memory stand-ins for the external tools

#![allow(dead_code)]

use backup_core::{
    BackupError, DumpInvoker, DumpTarget, OplogPositionSource, OplogTimestampReader, Result,
    SyncCollaborator, Timestamp,
};
use journal::{BackupStateStore, Collaborators, Orchestrator};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

pub fn ts(seconds: u32, increment: u32) -> Timestamp {
    Timestamp::new(seconds, increment)
}

/// Fake data store: answers position queries, "dumps", and replays
/// queued timestamp sequences for each oplog capture
#[derive(Default)]
pub struct FakeMongo {
    pub latest: Option<Timestamp>,
    pub segments: RefCell<VecDeque<Vec<Timestamp>>>,
    pub events: RefCell<Vec<String>>,
    pub gzip: bool,
    /// Simulate a dump tool that exits cleanly but writes nothing
    pub skip_oplog_file: bool,
    /// Simulate something deleting the chain folder while the full dump runs
    pub remove_chain_during_full_dump: bool,
}

impl FakeMongo {
    pub fn with_latest(latest: Timestamp) -> Self {
        Self {
            latest: Some(latest),
            ..Default::default()
        }
    }

    pub fn queue(&self, segment: Vec<Timestamp>) {
        self.segments.borrow_mut().push_back(segment);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl DumpInvoker for FakeMongo {
    fn dump(&self, target: DumpTarget, out_dir: &Path) -> Result<String> {
        match target {
            DumpTarget::Full => {
                self.events.borrow_mut().push("dump:full".to_string());
                if self.remove_chain_during_full_dump {
                    if let Some(chain_dir) = out_dir.parent() {
                        fs::remove_dir_all(chain_dir).unwrap();
                    }
                    return Ok(String::new());
                }
                fs::write(out_dir.join("users.bson"), b"data").unwrap();
                Ok("done dumping test.users (2 documents)".to_string())
            }
            DumpTarget::OplogSince(start) => {
                self.events.borrow_mut().push(format!("dump:oplog:{}", start));
                if !self.skip_oplog_file {
                    let path = self.oplog_dump_path(out_dir);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(&path, b"oplog").unwrap();
                }
                Ok(String::new())
            }
        }
    }

    fn compressed(&self) -> bool {
        self.gzip
    }
}

impl OplogTimestampReader for FakeMongo {
    fn read_timestamps(&self, file: &Path) -> Result<Vec<Timestamp>> {
        assert!(file.exists(), "reader called on missing file {}", file.display());
        self.events.borrow_mut().push("read".to_string());
        Ok(self.segments.borrow_mut().pop_front().unwrap_or_default())
    }
}

impl OplogPositionSource for FakeMongo {
    fn latest_position(&self) -> Result<Option<Timestamp>> {
        self.events.borrow_mut().push("position".to_string());
        Ok(self.latest)
    }
}

/// Records uploads; optionally fails them
#[derive(Default)]
pub struct FakeSync {
    pub uploads: RefCell<Vec<(PathBuf, String)>>,
    pub fail: bool,
}

impl SyncCollaborator for FakeSync {
    fn upload(&self, local_dir: &Path, chain: &str) -> Result<()> {
        if self.fail {
            return Err(BackupError::SyncFailure("bucket not found".to_string()));
        }
        self.uploads
            .borrow_mut()
            .push((local_dir.to_path_buf(), chain.to_string()));
        Ok(())
    }
}

pub fn orchestrator<'a>(
    root: &Path,
    mongo: &'a FakeMongo,
    sync: Option<&'a FakeSync>,
) -> Orchestrator<'a> {
    Orchestrator::new(
        BackupStateStore::new(root),
        Collaborators {
            dumper: mongo,
            reader: mongo,
            positions: mongo,
            sync: sync.map(|s| s as &dyn SyncCollaborator),
        },
    )
}

/// Names of oplog segment files in a chain folder, sorted
pub fn segment_files(chain_dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(chain_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| backup_core::is_segment_file_name(name))
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

/// True if a capture left its scratch directory behind
pub fn has_leftover_work_dirs(root: &Path) -> bool {
    fs::read_dir(root)
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("oplog-dump-"))
}
