//! pgbackup - Scheduled PostgreSQL backups with daily/weekly rotation
//!
//! Each run reads a flat settings file, decides whether today's backup is
//! weekly or daily, deletes expired backups of that class, dumps the
//! database with pg_dump and optionally compresses the result with 7z.
//! Scheduling is left to cron or a similar external scheduler.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Settings file location and parsing
//! - `error`: Custom error types and exit codes
//! - `backup`: Retention, pruning, dump and compression stages
//! - `cli`: Command handlers for the `pgbackup` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use pgbackup::backup::{BackupRunner, RunContext};
//! use pgbackup::config::{ConfigLocation, Settings};
//!
//! let location = ConfigLocation::resolve(None)?;
//! let settings = Settings::load(location.path())?;
//! let report = BackupRunner::new(&settings).run(&RunContext::start(&settings))?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;

pub use error::{BackupError, BackupResult};
