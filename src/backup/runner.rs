//! Backup run driver
//!
//! Runs the stages in order: classify, prune, create the destination,
//! dump, compress. The first fatal error ends the run; whatever earlier
//! stages did stays on disk.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use tracing::info;

use super::compress::{compress_artifact, ArchiveNaming, Archiver, CompressionOutcome, SevenZip};
use super::destination;
use super::dump::{dump_database, DumpTool, PgDump};
use super::pruner::{PruneReport, Pruner};
use super::retention::{classify, RetentionPlan};
use crate::config::Settings;
use crate::error::BackupResult;

/// Derived state of one run, fixed when the run starts
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Instant the run started; pruning cutoffs are relative to it
    pub now: DateTime<Local>,
    /// Date used in every name this run produces
    pub date: NaiveDate,
    pub plan: RetentionPlan,
    pub destination: PathBuf,
}

impl RunContext {
    /// Build the context for a run starting at `now`
    pub fn new(settings: &Settings, now: DateTime<Local>) -> Self {
        let date = now.date_naive();
        let plan = classify(&now, settings);
        let destination = destination::resolve(&settings.backup_dir, date, plan.class);

        Self {
            now,
            date,
            plan,
            destination,
        }
    }

    /// Context for a run starting right now
    pub fn start(settings: &Settings) -> Self {
        Self::new(settings, Local::now())
    }
}

/// What a run did
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub plan: RetentionPlan,
    pub destination: PathBuf,
    pub dry_run: bool,
    pub prune: PruneReport,
    /// The dump artifact, absent in a dry run
    pub artifact: Option<PathBuf>,
    pub compression: Option<CompressionOutcome>,
}

impl RunReport {
    /// The file that holds this run's backup
    pub fn final_output(&self) -> Option<&PathBuf> {
        match &self.compression {
            Some(outcome) => Some(&outcome.archive),
            None => self.artifact.as_ref(),
        }
    }
}

/// Executes backup runs with a given dump tool and archiver
pub struct BackupRunner<'a> {
    settings: &'a Settings,
    dump_tool: Box<dyn DumpTool + 'a>,
    archiver: Box<dyn Archiver + 'a>,
    dry_run: bool,
}

impl<'a> BackupRunner<'a> {
    /// Create a runner using pg_dump and 7z as configured
    pub fn new(settings: &'a Settings) -> Self {
        Self::with_tools(
            settings,
            PgDump::from_settings(settings),
            SevenZip::new(settings.archiver_program()),
        )
    }

    /// Create a runner with custom tools
    pub fn with_tools(
        settings: &'a Settings,
        dump_tool: impl DumpTool + 'a,
        archiver: impl Archiver + 'a,
    ) -> Self {
        Self {
            settings,
            dump_tool: Box::new(dump_tool),
            archiver: Box::new(archiver),
            dry_run: false,
        }
    }

    /// Prune in report-only mode and skip everything that writes
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Delete expired backups of this run's class
    pub fn prune(&self, ctx: &RunContext) -> PruneReport {
        info!(
            class = %ctx.plan.class,
            keep_days = ctx.plan.keep_days,
            root = %self.settings.backup_dir.display(),
            "pruning expired backups"
        );

        let report = Pruner::new(&self.settings.backup_dir)
            .dry_run(self.dry_run)
            .prune(ctx.plan.class, ctx.plan.keep_days, &ctx.now);

        info!(summary = %report.summary(), "pruning finished");
        report
    }

    /// Run every stage
    pub fn run(&self, ctx: &RunContext) -> BackupResult<RunReport> {
        let prune = self.prune(ctx);

        let mut report = RunReport {
            date: ctx.date,
            plan: ctx.plan,
            destination: ctx.destination.clone(),
            dry_run: self.dry_run,
            prune,
            artifact: None,
            compression: None,
        };

        if self.dry_run {
            info!(destination = %ctx.destination.display(), "dry run, skipping dump");
            return Ok(report);
        }

        destination::ensure(&ctx.destination)?;

        let artifact = dump_database(self.dump_tool.as_ref(), self.settings, &ctx.destination)?;
        report.artifact = Some(artifact.clone());

        match ArchiveNaming::for_format(&self.settings.format, &self.settings.database, ctx.date) {
            Some(naming) => {
                let archive = naming.archive_path(&artifact);
                let outcome = compress_artifact(self.archiver.as_ref(), &artifact, &archive)?;
                report.compression = Some(outcome);
            }
            None => {
                info!(format = %self.settings.format, "compression skipped for this format");
            }
        }

        Ok(report)
    }
}
