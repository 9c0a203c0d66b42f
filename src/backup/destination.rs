//! Per-run destination directory
//!
//! Every run writes into `<root>/<YYYY-MM-DD>-<class>`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use super::retention::RetentionClass;
use crate::error::{BackupError, BackupResult};

/// Date format used in directory and archive names
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Name of a retention directory, e.g. `2024-03-01-daily`
pub fn directory_name(date: NaiveDate, class: RetentionClass) -> String {
    format!("{}-{}", date.format(DATE_FORMAT), class.suffix())
}

/// Build the destination path for a run
pub fn resolve(root: &Path, date: NaiveDate, class: RetentionClass) -> PathBuf {
    root.join(directory_name(date, class))
}

/// Make sure the destination directory exists
///
/// Creates it and any missing parents when absent, does nothing when it
/// is already there.
pub fn ensure(path: &Path) -> BackupResult<()> {
    if path.is_dir() {
        debug!(path = %path.display(), "destination already exists");
        return Ok(());
    }

    create_dir(path).map_err(|e| BackupError::DestinationCreate {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    info!(path = %path.display(), "created destination directory");
    Ok(())
}

#[cfg(unix)]
fn create_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o755).create(path)
}

#[cfg(not(unix))]
fn create_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}
