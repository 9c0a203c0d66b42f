//! Backup pipeline for pgbackup
//!
//! Classifies each run, rotates old backups and produces a new one with
//! pg_dump, optionally compressed with 7z.
//!
//! # Architecture
//!
//! - `retention`: decides whether a run is daily or weekly
//! - `pruner`: deletes expired directories of one class
//! - `destination`: names and creates the per-run directory
//! - `dump`: the `DumpTool` capability and its pg_dump implementation
//! - `compress`: the `Archiver` capability, its 7z implementation and the
//!   archive naming policies
//! - `runner`: `RunContext` and `BackupRunner`, which run the stages in order
//!
//! # Layout
//!
//! ```text
//! <BACKUP_DIR>/
//!   2024-03-01-weekly/orders.dump
//!   2024-03-02-daily/orders.tar.7z
//!   2024-03-03-daily/orders_2024-03-03.7z
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use pgbackup::backup::{BackupRunner, RunContext};
//! use pgbackup::config::Settings;
//!
//! let settings = Settings::load(path)?;
//! let ctx = RunContext::start(&settings);
//! let report = BackupRunner::new(&settings).run(&ctx)?;
//! println!("{}", report.prune.summary());
//! ```

pub mod compress;
pub mod destination;
pub mod dump;
mod process;
pub mod pruner;
pub mod retention;
pub mod runner;

pub use compress::{compress_artifact, ArchiveNaming, Archiver, CompressionOutcome, SevenZip};
pub use dump::{dump_database, DumpRequest, DumpTool, PgDump};
pub use pruner::{prune, PruneReport, Pruner};
pub use retention::{classify, RetentionClass, RetentionPlan};
pub use runner::{BackupRunner, RunContext, RunReport};
