//! Dump pipeline
//!
//! Produces one backup artifact per run with pg_dump. The artifact is
//! named `<database>.<ext>` where the extension follows the dump format.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use super::process::{render_args, run_captured};
use crate::config::{DumpFormat, Settings};
use crate::error::{BackupError, BackupResult};

/// Connection parameters and output path for one dump
#[derive(Clone)]
pub struct DumpRequest<'a> {
    pub host: &'a str,
    pub port: &'a str,
    pub user: &'a str,
    pub password: &'a str,
    pub format: &'a DumpFormat,
    pub database: &'a str,
    pub output: &'a Path,
}

impl<'a> DumpRequest<'a> {
    /// Build a request from the run settings
    pub fn from_settings(settings: &'a Settings, output: &'a Path) -> Self {
        Self {
            host: &settings.hostname,
            port: &settings.port,
            user: &settings.user,
            password: settings.password.as_str(),
            format: &settings.format,
            database: &settings.database,
            output,
        }
    }

    /// pg_dump command line arguments
    ///
    /// The password is never part of these; it travels in `PGPASSWORD`.
    /// The format code is passed through unchecked, even when empty.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            format!("--host={}", self.host).into(),
            format!("--port={}", self.port).into(),
            format!("--username={}", self.user).into(),
            format!("--format={}", self.format.code()).into(),
            "-f".into(),
            self.output.as_os_str().to_owned(),
            self.database.into(),
        ]
    }
}

/// Something that can write a database dump to a file
pub trait DumpTool {
    fn dump(&self, request: &DumpRequest<'_>) -> BackupResult<()>;
}

/// Runs the pg_dump binary
#[derive(Debug, Clone)]
pub struct PgDump {
    program: PathBuf,
}

impl PgDump {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.pg_dump_program())
    }
}

impl DumpTool for PgDump {
    fn dump(&self, request: &DumpRequest<'_>) -> BackupResult<()> {
        let args = request.args();
        let rendered = render_args(args.iter().map(|a| a.as_os_str()));
        info!(
            command = %format!("{} {}", self.program.display(), rendered),
            "running pg_dump"
        );

        let mut command = Command::new(&self.program);
        command.args(&args).env("PGPASSWORD", request.password);

        let captured = run_captured(&mut command)?;
        if !captured.success() {
            return Err(BackupError::DumpFailed {
                status: captured.status_text(),
                output: captured.output,
            });
        }

        Ok(())
    }
}

/// Where the artifact for this run goes
pub fn artifact_path(settings: &Settings, destination: &Path) -> PathBuf {
    destination.join(format!(
        "{}.{}",
        settings.database,
        settings.format.extension()
    ))
}

/// Dump the configured database into the destination directory
///
/// Returns the artifact path. Empty connection fields are passed through
/// as-is; pg_dump reports them.
pub fn dump_database(
    tool: &dyn DumpTool,
    settings: &Settings,
    destination: &Path,
) -> BackupResult<PathBuf> {
    let artifact = artifact_path(settings, destination);
    let request = DumpRequest::from_settings(settings, &artifact);

    tool.dump(&request)?;

    info!(artifact = %artifact.display(), "backup written");
    Ok(artifact)
}
