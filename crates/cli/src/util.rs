//! Presentation helpers shared by the commands

use anyhow::{Context, Result};
use backup_core::{is_segment_file_name, Timestamp};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use walkdir::WalkDir;

/// Wall-clock time of an oplog position ("2024-01-03 14:30:00 UTC")
pub fn format_position_time(position: Timestamp) -> String {
    match DateTime::<Utc>::from_timestamp(i64::from(position.seconds), 0) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "unknown".to_string(),
    }
}

/// Age of an oplog position relative to `now` ("2 hours ago")
pub fn format_position_age(position: Timestamp, now: DateTime<Utc>) -> String {
    let seconds = now.timestamp() - i64::from(position.seconds);
    if seconds < 0 {
        return "in the future".to_string();
    }

    if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else {
        format!("{} days ago", seconds / 86400)
    }
}

/// Format file size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}

/// On-disk footprint of one chain folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainUsage {
    /// Oplog segment files directly under the chain folder
    pub segments: usize,
    /// Total bytes, full dump included
    pub bytes: u64,
}

pub fn chain_usage(chain_dir: &Path) -> Result<ChainUsage> {
    let mut usage = ChainUsage::default();
    if !chain_dir.exists() {
        return Ok(usage);
    }

    for entry in WalkDir::new(chain_dir) {
        let entry = entry.with_context(|| format!("Failed to scan {}", chain_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        usage.bytes += entry
            .metadata()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?
            .len();

        let is_segment = entry.depth() == 1
            && entry
                .file_name()
                .to_str()
                .is_some_and(is_segment_file_name);
        if is_segment {
            usage.segments += 1;
        }
    }

    Ok(usage)
}

/// Spinner on stderr; hidden automatically when stderr is not a terminal
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
