//! Blocking execution of external programs
//!
//! Programs are spawned directly, without a shell, and waited on to
//! completion. Standard output and standard error are captured and
//! joined so a failure can be reported with everything the tool said.

use std::ffi::OsStr;
use std::process::{Command, ExitStatus};

use tracing::debug;

use crate::error::BackupError;

/// Exit status and combined output of a finished program
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub output: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Status rendered for error messages
    pub fn status_text(&self) -> String {
        self.status.to_string()
    }
}

/// Run a command to completion, capturing stdout and stderr
///
/// Only a failure to start the program is an error here; a non-zero exit
/// is returned to the caller, which knows what kind of failure it is.
pub fn run_captured(command: &mut Command) -> Result<Captured, BackupError> {
    let program = command.get_program().to_string_lossy().to_string();
    debug!(program = %program, args = ?render_args(command.get_args()), "spawning");

    let output = command.output().map_err(|e| BackupError::Spawn {
        program: program.clone(),
        reason: e.to_string(),
    })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&stderr);
    }

    debug!(program = %program, status = %output.status, "finished");
    Ok(Captured {
        status: output.status,
        output: combined,
    })
}

/// Arguments joined for display
pub fn render_args<'a>(args: impl Iterator<Item = &'a OsStr>) -> String {
    args.map(|a| a.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
