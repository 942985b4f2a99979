//! Reading oplog entry timestamps through `bsondump`
//!
//! bsondump prints one extended-JSON document per line. Only the `ts` field
//! of each entry matters here:
//!
//! ```text
//! {"ts":{"$timestamp":{"t":1000,"i":5}},"op":"i","ns":"app.users",...}
//! ```

use crate::process;
use backup_core::{BackupError, OplogTimestampReader, Result, Timestamp};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// `OplogTimestampReader` backed by the bsondump executable
#[derive(Debug, Clone)]
pub struct Bsondump {
    pub program: PathBuf,
}

#[derive(Deserialize)]
struct OplogLine {
    ts: ExtendedTimestamp,
}

#[derive(Deserialize)]
struct ExtendedTimestamp {
    #[serde(rename = "$timestamp")]
    timestamp: RawTimestamp,
}

#[derive(Deserialize)]
struct RawTimestamp {
    t: u32,
    i: u32,
}

impl Bsondump {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn failure(&self, message: String) -> BackupError {
        BackupError::ToolFailure {
            tool: process::tool_name(&self.program),
            message,
        }
    }

    /// Run bsondump over a plain BSON file
    fn dump_plain(&self, file: &Path) -> Result<std::process::Output> {
        process::run(Command::new(&self.program).arg(file))
            .map_err(|e| self.failure(format!("failed to start: {}", e)))
    }

    /// Run bsondump over a gzipped BSON file, decompressing into its stdin
    fn dump_gzip(&self, file: &Path) -> Result<std::process::Output> {
        let compressed = File::open(file)
            .map_err(|e| BackupError::io(format!("Failed to open {}", file.display()), e))?;

        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(format!("failed to start: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failure("stdin was not captured".to_string()))?;

        // Feed stdin from a separate thread so a full stdout pipe can't stall us
        let feeder = std::thread::spawn(move || -> std::io::Result<()> {
            let mut decoder = GzDecoder::new(BufReader::new(compressed));
            std::io::copy(&mut decoder, &mut stdin)?;
            stdin.flush()
        });

        let output = child
            .wait_with_output()
            .map_err(|e| self.failure(format!("failed to wait: {}", e)))?;

        let fed = feeder.join();
        // A tool that died early breaks the pipe; report the tool, not the pipe
        if !output.status.success() {
            return Ok(output);
        }

        match fed {
            Ok(Ok(())) => Ok(output),
            Ok(Err(e)) => Err(BackupError::io(
                format!("Failed to decompress {}", file.display()),
                e,
            )),
            Err(_) => Err(self.failure("decompression thread panicked".to_string())),
        }
    }
}

impl OplogTimestampReader for Bsondump {
    fn read_timestamps(&self, file: &Path) -> Result<Vec<Timestamp>> {
        let gzipped = file.extension().map_or(false, |ext| ext == "gz");
        let output = if gzipped {
            self.dump_gzip(file)?
        } else {
            self.dump_plain(file)?
        };

        if !output.status.success() {
            return Err(self.failure(process::describe_failure(&output)));
        }

        parse_timestamps(&String::from_utf8_lossy(&output.stdout))
            .map_err(|message| self.failure(message))
    }
}

/// Timestamps of every entry in bsondump's output, in order
pub fn parse_timestamps(output: &str) -> std::result::Result<Vec<Timestamp>, String> {
    output
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<OplogLine>(line)
                .map(|entry| Timestamp::new(entry.ts.timestamp.t, entry.ts.timestamp.i))
                .map_err(|e| format!("malformed oplog entry on line {}: {}", n + 1, e))
        })
        .collect()
}
