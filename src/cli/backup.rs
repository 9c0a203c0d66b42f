//! Backup CLI commands
//!
//! Implements the `run`, `prune` and `config` commands.

use clap::Subcommand;

use crate::backup::{BackupRunner, RunContext, RunReport};
use crate::config::{ConfigLocation, Settings};
use crate::error::{BackupError, BackupResult};

/// Backup subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BackupCommands {
    /// Prune expired backups, dump the database and compress the result
    Run {
        /// Show what would be pruned without deleting or dumping anything
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Only delete expired backups of today's retention class
    Prune {
        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the resolved settings file and its values
    Config,
}

impl Default for BackupCommands {
    fn default() -> Self {
        Self::Run {
            dry_run: false,
            json: false,
        }
    }
}

/// Handle a backup command
pub fn handle_backup_command(
    location: &ConfigLocation,
    settings: &Settings,
    cmd: BackupCommands,
) -> BackupResult<()> {
    match cmd {
        BackupCommands::Run { dry_run, json } => {
            let ctx = RunContext::start(settings);
            let report = BackupRunner::new(settings).dry_run(dry_run).run(&ctx)?;

            if json {
                let rendered = serde_json::to_string_pretty(&report).map_err(|e| {
                    BackupError::Io(format!("Failed to serialize run report: {}", e))
                })?;
                println!("{}", rendered);
            } else {
                print_run_report(&report);
            }
        }

        BackupCommands::Prune { dry_run } => {
            let ctx = RunContext::start(settings);
            let report = BackupRunner::new(settings).dry_run(dry_run).prune(&ctx);

            println!(
                "Retention: {} (keep {} days)",
                ctx.plan.class, ctx.plan.keep_days
            );
            if dry_run {
                println!("Dry run, nothing deleted.");
            }
            for path in &report.deleted {
                println!("  deleted {}", path.display());
            }
            for issue in report.skipped.iter().chain(&report.failed) {
                println!("  problem {}: {}", issue.path.display(), issue.reason);
            }
            if !report.is_clean() {
                println!("Warning: some expired backups could not be deleted");
            }
            println!("Prune: {}", report.summary());
        }

        BackupCommands::Config => {
            println!("pgbackup Configuration");
            println!("======================");
            println!("Settings file: {}", location.path().display());
            println!();
            println!("  Host:            {}", settings.hostname);
            println!("  Port:            {}", settings.port);
            println!("  User:            {}", settings.user);
            println!(
                "  Password:        {}",
                if settings.has_password() { "(set)" } else { "(not set)" }
            );
            println!("  Database:        {}", settings.database);
            println!("  Backup dir:      {}", settings.backup_dir.display());
            println!("  Format:          {}", settings.format);
            println!("  Weekly on day:   {}", settings.day_of_week_to_keep);
            println!("  Days to keep:    {}", settings.days_to_keep);
            println!("  Weeks to keep:   {}", settings.weeks_to_keep);
            println!("  pg_dump:         {}", settings.pg_dump_program());
            println!("  Archiver:        {}", settings.archiver_program());
        }
    }

    Ok(())
}

fn print_run_report(report: &RunReport) {
    println!(
        "Retention: {} (keep {} days)",
        report.plan.class, report.plan.keep_days
    );
    println!("Prune: {}", report.prune.summary());
    for issue in report.prune.skipped.iter().chain(&report.prune.failed) {
        println!("  problem {}: {}", issue.path.display(), issue.reason);
    }
    if !report.prune.is_clean() {
        println!("Warning: some expired backups could not be deleted");
    }

    if report.dry_run {
        println!("Dry run: backup would be written to {}", report.destination.display());
        return;
    }

    if let Some(output) = report.final_output() {
        let size = std::fs::metadata(output)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        println!("Backup created: {} ({})", output.display(), size);
    }

    if let Some(error) = report
        .compression
        .as_ref()
        .and_then(|c| c.cleanup_error.as_ref())
    {
        println!("Warning: uncompressed backup left in place: {}", error);
    }
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
