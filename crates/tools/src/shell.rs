//! Latest oplog position through the `mongo` shell

use crate::connection::MongoConnection;
use crate::process;
use backup_core::{BackupError, OplogPositionSource, Result, Timestamp};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Command;

/// Prints `{"position": {"seconds": S, "increment": I}}` for the newest oplog
/// entry, or `{"position": null}` when the oplog is empty
pub const LATEST_POSITION_SCRIPT: &str = r#"
var cursor = db.getSiblingDB('local').oplog.rs.find({}, {ts: 1}).sort({$natural: -1}).limit(1);
var last = cursor.hasNext() ? cursor.next().ts : null;
print(JSON.stringify({position: last ? {seconds: last.t, increment: last.i} : null}));
"#;

/// `OplogPositionSource` backed by the mongo shell
#[derive(Debug, Clone)]
pub struct MongoShell {
    pub program: PathBuf,
    pub connection: MongoConnection,
}

#[derive(Deserialize)]
struct PositionResponse {
    position: Option<Timestamp>,
}

impl MongoShell {
    pub fn new(program: impl Into<PathBuf>, connection: MongoConnection) -> Self {
        Self {
            program: program.into(),
            connection,
        }
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["--quiet".to_string()];
        args.extend(self.connection.args());
        args.push("admin".to_string());
        args.push("--eval".to_string());
        args.push(LATEST_POSITION_SCRIPT.to_string());
        args
    }

    fn failure(&self, message: String) -> BackupError {
        BackupError::ToolFailure {
            tool: process::tool_name(&self.program),
            message,
        }
    }
}

impl OplogPositionSource for MongoShell {
    fn latest_position(&self) -> Result<Option<Timestamp>> {
        let output = process::run(Command::new(&self.program).args(self.args()))
            .map_err(|e| self.failure(format!("failed to start: {}", e)))?;

        if !output.status.success() {
            return Err(self.failure(process::describe_failure(&output)));
        }

        let position = parse_position_response(&String::from_utf8_lossy(&output.stdout))
            .map_err(|message| self.failure(message))?;
        tracing::debug!(position = ?position, "Latest oplog position");
        Ok(position)
    }
}

/// Extract the position from the shell's output
///
/// The shell may print banners or warnings first; the script's JSON is the
/// last non-empty line.
pub fn parse_position_response(output: &str) -> std::result::Result<Option<Timestamp>, String> {
    let line = output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| "no output from position query".to_string())?;

    serde_json::from_str::<PositionResponse>(line)
        .map(|response| response.position)
        .map_err(|e| format!("unexpected position query output '{}': {}", line, e))
}
