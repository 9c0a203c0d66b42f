//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup pipeline.

pub mod backup;

pub use backup::{handle_backup_command, BackupCommands};
