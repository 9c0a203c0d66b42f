//! Compression stage
//!
//! Wraps a finished artifact in a 7z archive and removes the original.
//! Which formats are compressed, and how the archive is named, is decided
//! by [`ArchiveNaming::for_format`].

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::destination::DATE_FORMAT;
use super::process::run_captured;
use crate::config::DumpFormat;
use crate::error::{BackupError, BackupResult};

/// Extension of every archive this stage writes
pub const ARCHIVE_EXTENSION: &str = "7z";

/// Something that can pack one file into a new archive
pub trait Archiver {
    fn compress(&self, source: &Path, archive: &Path) -> BackupResult<()>;
}

/// Runs `7z a -t7z <archive> <source>`
#[derive(Debug, Clone)]
pub struct SevenZip {
    program: PathBuf,
}

impl SevenZip {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Archiver for SevenZip {
    fn compress(&self, source: &Path, archive: &Path) -> BackupResult<()> {
        let mut command = Command::new(&self.program);
        command.arg("a").arg("-t7z").arg(archive).arg(source);

        let captured = run_captured(&mut command)?;
        if !captured.success() {
            return Err(BackupError::ArchiveFailed {
                status: captured.status_text(),
                output: captured.output,
            });
        }

        Ok(())
    }
}

/// How the archive of an artifact is named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveNaming {
    /// `<artifact>.7z`, used for tar dumps
    AppendSuffix,
    /// `<dir>/<database>_<date>.7z`, used for plain SQL dumps
    Dated { database: String, date: NaiveDate },
}

impl ArchiveNaming {
    /// Naming policy for a dump format, or `None` when the format is not compressed
    ///
    /// Only tar (`t`) and plain (`p`) dumps are compressed. An unset format
    /// also produces SQL, but is left alone.
    pub fn for_format(format: &DumpFormat, database: &str, date: NaiveDate) -> Option<Self> {
        match format {
            DumpFormat::Tar => Some(Self::AppendSuffix),
            DumpFormat::Plain => Some(Self::Dated {
                database: database.to_string(),
                date,
            }),
            _ => None,
        }
    }

    /// Archive path for an artifact
    pub fn archive_path(&self, artifact: &Path) -> PathBuf {
        match self {
            Self::AppendSuffix => {
                let mut name = artifact.as_os_str().to_owned();
                name.push(".");
                name.push(ARCHIVE_EXTENSION);
                PathBuf::from(name)
            }
            Self::Dated { database, date } => {
                let dir = artifact.parent().unwrap_or_else(|| Path::new(""));
                dir.join(format!(
                    "{}_{}.{}",
                    database,
                    date.format(DATE_FORMAT),
                    ARCHIVE_EXTENSION
                ))
            }
        }
    }
}

/// Result of compressing an artifact
#[derive(Debug, Clone, Serialize)]
pub struct CompressionOutcome {
    pub archive: PathBuf,
    /// Whether the uncompressed artifact was removed
    pub original_removed: bool,
    /// Set when the artifact outlived the compression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_error: Option<String>,
}

/// Compress `source` into `archive`, then remove `source`
///
/// When the archiver fails the source stays in place. When only the
/// removal fails the archive is already complete, so the error is logged
/// and recorded in the outcome.
pub fn compress_artifact(
    archiver: &dyn Archiver,
    source: &Path,
    archive: &Path,
) -> BackupResult<CompressionOutcome> {
    info!(source = %source.display(), archive = %archive.display(), "compressing backup");

    archiver.compress(source, archive)?;
    info!(archive = %archive.display(), "backup compressed");

    let (original_removed, cleanup_error) = match fs::remove_file(source) {
        Ok(()) => (true, None),
        Err(e) => {
            warn!(path = %source.display(), error = %e, "failed to remove uncompressed backup");
            (false, Some(e.to_string()))
        }
    };

    Ok(CompressionOutcome {
        archive: archive.to_path_buf(),
        original_removed,
        cleanup_error,
    })
}
