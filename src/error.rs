//! Custom error types for pgbackup
//!
//! This module defines the error hierarchy for a backup run using thiserror
//! for ergonomic error definitions. Every variant is fatal for the run;
//! per-entry pruning problems are collected in reports instead.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for pgbackup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Configuration file missing, unreadable or unlocatable
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// The per-run destination directory could not be created
    #[error("Failed to create destination directory {}: {reason}", path.display())]
    DestinationCreate { path: PathBuf, reason: String },

    /// An external program could not be started at all
    #[error("Failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// The dump tool exited unsuccessfully
    #[error("pg_dump failed ({status}):\n{output}")]
    DumpFailed { status: String, output: String },

    /// The archiver exited unsuccessfully
    #[error("Archiver failed ({status}):\n{output}")]
    ArchiveFailed { status: String, output: String },
}

impl BackupError {
    /// Process exit code a scheduler can branch on
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) | Self::DestinationCreate { .. } => 3,
            Self::Spawn { .. } | Self::DumpFailed { .. } => 4,
            Self::ArchiveFailed { .. } => 5,
        }
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for pgbackup operations
pub type BackupResult<T> = Result<T, BackupError>;
