//! Lock file giving one invocation exclusive use of a backup root

use crate::layout::LOCK_FILE;
use backup_core::{BackupError, IoContext, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Exclusive hold on a backup root, released on drop
///
/// The lock file itself stays in place. Only the `flock` on it is released,
/// when the handle closes, so every invocation contends on the same inode.
#[derive(Debug)]
pub struct BackupLock {
    path: PathBuf,
    #[allow(dead_code)]
    file: File,
}

/// Lock file content
#[derive(Debug, Serialize, Deserialize)]
struct LockContent {
    pid: u32,
    started_at: u64,
}

impl BackupLock {
    /// Acquire the lock for `root` without blocking
    ///
    /// Fails with `Locked` if another invocation holds it.
    pub fn acquire(root: &Path) -> Result<Self> {
        let lock_path = root.join(LOCK_FILE);

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .io_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

        if !try_flock_exclusive(&file)
            .io_context(|| format!("Failed to lock {}", lock_path.display()))?
        {
            if let Ok(holder) = Self::read_lock_content(&mut file) {
                tracing::warn!(pid = holder.pid, "Backup root is locked by another process");
            }
            return Err(BackupError::Locked { path: lock_path });
        }

        Self::write_lock_content(&mut file)
            .io_context(|| format!("Failed to write lock file {}", lock_path.display()))?;

        tracing::debug!(path = %lock_path.display(), "Acquired backup lock");
        Ok(Self {
            path: lock_path,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether some invocation currently holds the lock for `root`
    ///
    /// A leftover file from a finished or killed run does not count.
    pub fn is_held(root: &Path) -> Result<bool> {
        let lock_path = root.join(LOCK_FILE);
        let file = match File::open(&lock_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(BackupError::io(
                    format!("Failed to open lock file {}", lock_path.display()),
                    e,
                ))
            }
        };

        // Our own probe lock is released when `file` closes
        let acquired = try_flock_exclusive(&file)
            .io_context(|| format!("Failed to probe {}", lock_path.display()))?;
        Ok(!acquired)
    }

    fn write_lock_content(file: &mut File) -> std::io::Result<()> {
        let content = LockContent {
            pid: std::process::id(),
            started_at: current_timestamp_ms(),
        };

        let serialized = serde_json::to_string(&content)?;

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all()
    }

    fn read_lock_content(file: &mut File) -> std::io::Result<LockContent> {
        file.seek(SeekFrom::Start(0))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Try to acquire exclusive file lock (non-blocking)
#[cfg(unix)]
fn try_flock_exclusive(file: &File) -> std::io::Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(()) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn try_flock_exclusive(_file: &File) -> std::io::Result<bool> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "backup-root locking needs flock(2)",
    ))
}

fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
