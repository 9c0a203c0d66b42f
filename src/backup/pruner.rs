//! Pruning of expired retention directories
//!
//! Candidates are the immediate children of the backup root matching
//! `*-<class>`. A candidate is removed as a whole once its modification
//! time is strictly before `now - keep_days`. Problems with one candidate
//! never stop the pass; they are recorded in the [`PruneReport`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Days, TimeDelta, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::retention::RetentionClass;

/// A candidate the pruner could not handle
#[derive(Debug, Clone, Serialize)]
pub struct PruneIssue {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a pruning pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneReport {
    /// Entries older than this were eligible for deletion
    pub cutoff: Option<DateTime<Utc>>,
    /// Entries removed (or that would be removed in a dry run)
    pub deleted: Vec<PathBuf>,
    /// Entries young enough to keep
    pub retained: Vec<PathBuf>,
    /// Entries whose metadata could not be read
    pub skipped: Vec<PruneIssue>,
    /// Entries that could not be removed
    pub failed: Vec<PruneIssue>,
}

impl PruneReport {
    /// Whether every eligible entry was removed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line summary for the console
    pub fn summary(&self) -> String {
        format!(
            "{} deleted, {} kept, {} skipped, {} failed",
            self.deleted.len(),
            self.retained.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

/// Removes expired backups of one retention class under a root directory
pub struct Pruner {
    root: PathBuf,
    dry_run: bool,
}

impl Pruner {
    /// Create a new Pruner for the given backup root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
        }
    }

    /// Only report what would be deleted
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one pruning pass
    pub fn prune<Tz: TimeZone>(
        &self,
        class: RetentionClass,
        keep_days: i64,
        now: &DateTime<Tz>,
    ) -> PruneReport {
        let mut report = PruneReport::default();

        let Some(cutoff) = cutoff(now, keep_days) else {
            warn!(keep_days, "keep window out of range, nothing pruned");
            return report;
        };
        report.cutoff = Some(cutoff);
        let cutoff_time = SystemTime::from(cutoff);

        for path in self.candidates(class) {
            let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot stat backup, skipping");
                    report.skipped.push(PruneIssue {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if modified >= cutoff_time {
                debug!(path = %path.display(), "within keep window");
                report.retained.push(path);
                continue;
            }

            if self.dry_run {
                info!(path = %path.display(), "would delete expired backup");
                report.deleted.push(path);
                continue;
            }

            match remove_entry(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "deleted expired backup");
                    report.deleted.push(path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to delete expired backup");
                    report.failed.push(PruneIssue {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Glob matching `*-<class>` inside the root
    ///
    /// An empty root stays relative to the working directory, like
    /// `destination::resolve`, instead of becoming `/`.
    fn pattern(&self, class: RetentionClass) -> String {
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        PathBuf::from(root)
            .join(format!("*-{}", class.suffix()))
            .to_string_lossy()
            .to_string()
    }

    /// Children of the root named `*-<class>`
    fn candidates(&self, class: RetentionClass) -> Vec<PathBuf> {
        let pattern = self.pattern(class);

        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "invalid backup pattern");
                return Vec::new();
            }
        };

        paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(
                        path = %e.path().display(),
                        error = %e.error(),
                        "cannot read backup entry"
                    );
                    None
                }
            })
            .collect()
    }
}

/// Prune `root` of expired `class` backups
pub fn prune<Tz: TimeZone>(
    root: &Path,
    class: RetentionClass,
    keep_days: i64,
    now: &DateTime<Tz>,
) -> PruneReport {
    Pruner::new(root).prune(class, keep_days, now)
}

/// `now` minus `keep_days` calendar days
///
/// Negative windows move the cutoff into the future. Returns `None` only
/// when the result is not representable.
pub fn cutoff<Tz: TimeZone>(now: &DateTime<Tz>, keep_days: i64) -> Option<DateTime<Utc>> {
    let days = Days::new(keep_days.unsigned_abs());
    let calendar = if keep_days >= 0 {
        now.clone().checked_sub_days(days)
    } else {
        now.clone().checked_add_days(days)
    };

    // A DST gap can make the calendar result nonexistent; fall back to whole days.
    let shifted = match calendar {
        Some(shifted) => Some(shifted),
        None => TimeDelta::try_days(keep_days).and_then(|d| now.clone().checked_sub_signed(d)),
    };

    shifted.map(|dt| dt.with_timezone(&Utc))
}

fn remove_entry(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
