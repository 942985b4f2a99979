//! Upload of chain folders to S3 via `aws s3 sync`

use crate::process;
use backup_core::{BackupError, Result, SyncCollaborator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Bucket coordinates and credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Target {
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Key prefix under which each chain gets its own folder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

impl S3Target {
    /// `s3://<bucket>/<prefix>/<chain>`
    pub fn destination(&self, chain: &str) -> String {
        let prefix = self.prefix.as_deref().unwrap_or("backups").trim_matches('/');
        if prefix.is_empty() {
            format!("s3://{}/{}", self.bucket, chain)
        } else {
            format!("s3://{}/{}/{}", self.bucket, prefix, chain)
        }
    }
}

/// `SyncCollaborator` backed by the AWS CLI
#[derive(Debug, Clone)]
pub struct S3Sync {
    pub program: PathBuf,
    pub target: S3Target,
}

impl S3Sync {
    pub fn new(program: impl Into<PathBuf>, target: S3Target) -> Self {
        Self {
            program: program.into(),
            target,
        }
    }

    pub fn sync_args(&self, local_dir: &Path, chain: &str) -> Vec<String> {
        let mut args = vec![
            "s3".to_string(),
            "sync".to_string(),
            local_dir.display().to_string(),
            self.target.destination(chain),
            "--no-progress".to_string(),
        ];
        if let Some(region) = &self.target.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        args
    }
}

impl SyncCollaborator for S3Sync {
    fn upload(&self, local_dir: &Path, chain: &str) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.args(self.sync_args(local_dir, chain));
        if let Some(key) = &self.target.access_key_id {
            command.env("AWS_ACCESS_KEY_ID", key);
        }
        if let Some(secret) = &self.target.secret_access_key {
            command.env("AWS_SECRET_ACCESS_KEY", secret);
        }

        let output = process::run(&mut command).map_err(|e| {
            BackupError::SyncFailure(format!(
                "failed to run {}: {}",
                process::tool_name(&self.program),
                e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackupError::SyncFailure(format!(
                "{} ({})",
                classify_failure(&stderr),
                process::describe_failure(&output)
            )));
        }

        tracing::debug!(destination = %self.target.destination(chain), "Upload finished");
        Ok(())
    }
}

/// Short, operator-facing cause for a failed upload
pub fn classify_failure(stderr: &str) -> &'static str {
    let lower = stderr.to_lowercase();
    if lower.contains("accessdenied")
        || lower.contains("invalidaccesskeyid")
        || lower.contains("signaturedoesnotmatch")
        || lower.contains("unable to locate credentials")
    {
        "authentication failed"
    } else if lower.contains("nosuchbucket") {
        "bucket not found"
    } else if lower.contains("could not connect")
        || lower.contains("connect timeout")
        || lower.contains("network")
    {
        "network error"
    } else {
        "upload failed"
    }
}
