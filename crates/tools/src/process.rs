//! Helpers for running external tools

use std::path::Path;
use std::process::{Command, Output};

/// Run `command` to completion, capturing stdout and stderr
pub(crate) fn run(command: &mut Command) -> std::io::Result<Output> {
    tracing::debug!(program = ?command.get_program(), "Running external tool");
    command.output()
}

/// One-line description of a failed run
pub(crate) fn describe_failure(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        format!("exited with {}: {}", output.status, stderr)
    }
}

/// stdout followed by stderr, as the tool printed them
pub(crate) fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

/// Display name of a configured executable
pub(crate) fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}
