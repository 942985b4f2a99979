//! Full and oplog dumps through `mongodump`

use crate::connection::MongoConnection;
use crate::process;
use backup_core::{BackupError, DumpInvoker, DumpTarget, Result, Timestamp};
use std::path::{Path, PathBuf};
use std::process::Command;

/// `DumpInvoker` backed by the mongodump executable
#[derive(Debug, Clone)]
pub struct Mongodump {
    pub program: PathBuf,
    pub connection: MongoConnection,
    pub gzip: bool,
}

impl Mongodump {
    pub fn new(program: impl Into<PathBuf>, connection: MongoConnection, gzip: bool) -> Self {
        Self {
            program: program.into(),
            connection,
            gzip,
        }
    }

    /// Command-line arguments for dumping `target` into `out_dir`
    pub fn dump_args(&self, target: DumpTarget, out_dir: &Path) -> Vec<String> {
        let mut args = self.connection.args();
        args.push("--out".to_string());
        args.push(out_dir.display().to_string());

        if let DumpTarget::OplogSince(start) = target {
            args.extend([
                "--db".to_string(),
                "local".to_string(),
                "--collection".to_string(),
                "oplog.rs".to_string(),
                "--query".to_string(),
                oplog_query(start),
            ]);
        }

        if self.gzip {
            args.push("--gzip".to_string());
        }

        args
    }
}

/// Extended-JSON filter selecting entries at or after `start`
pub fn oplog_query(start: Timestamp) -> String {
    format!(
        r#"{{"ts": {{"$gte": {{"$timestamp": {{"t": {}, "i": {}}}}}}}}}"#,
        start.seconds, start.increment
    )
}

impl DumpInvoker for Mongodump {
    fn dump(&self, target: DumpTarget, out_dir: &Path) -> Result<String> {
        let tool = process::tool_name(&self.program);
        let output = process::run(Command::new(&self.program).args(self.dump_args(target, out_dir)))
            .map_err(|e| BackupError::DumpToolFailure(format!("failed to run {}: {}", tool, e)))?;

        if !output.status.success() {
            return Err(BackupError::DumpToolFailure(format!(
                "{} {}",
                tool,
                process::describe_failure(&output)
            )));
        }

        Ok(process::combined_output(&output))
    }

    fn compressed(&self) -> bool {
        self.gzip
    }
}
