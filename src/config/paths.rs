//! Config file location for pgbackup
//!
//! ## Path Resolution Order
//!
//! 1. `--config <path>` on the command line (if given)
//! 2. `PGBACKUP_CONFIG` environment variable (if set)
//! 3. `pgbackup.cfg` in the directory holding the executable

use std::path::{Path, PathBuf};

use crate::error::BackupError;

/// Name of the settings file looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "pgbackup.cfg";

/// Environment variable overriding the settings file location
pub const CONFIG_ENV_VAR: &str = "PGBACKUP_CONFIG";

/// Where the settings file for this run lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    path: PathBuf,
}

impl ConfigLocation {
    /// Resolve the settings file location
    ///
    /// An explicit path wins, then `PGBACKUP_CONFIG`, then the file next to
    /// the running executable.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given and the executable path
    /// cannot be determined.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self, BackupError> {
        if let Some(path) = explicit {
            return Ok(Self { path });
        }

        if let Ok(custom) = std::env::var(CONFIG_ENV_VAR) {
            if !custom.trim().is_empty() {
                return Ok(Self {
                    path: PathBuf::from(custom),
                });
            }
        }

        let exe = std::env::current_exe().map_err(|e| {
            BackupError::Config(format!("Could not determine executable path: {}", e))
        })?;
        Ok(Self::beside(&exe))
    }

    /// Location of the settings file next to the given executable
    pub fn beside(executable: &Path) -> Self {
        let dir = executable.parent().unwrap_or_else(|| Path::new("."));
        Self {
            path: dir.join(CONFIG_FILE_NAME),
        }
    }

    /// Get the settings file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
