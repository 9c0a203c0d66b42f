//! Backup settings for pgbackup
//!
//! Settings are read from a flat text file with one `KEY=VALUE` pair per
//! line. Blank lines and lines starting with `#` are ignored, unknown keys
//! are skipped and malformed integers fall back to zero. Nothing is
//! validated here; bad values surface later as pg_dump or 7z failures.

use std::fmt;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::error::BackupError;

/// Default dump program when `PG_DUMP_BIN` is not set
pub const DEFAULT_PG_DUMP: &str = "pg_dump";

/// Default archiver program when `ARCHIVER_BIN` is not set
pub const DEFAULT_ARCHIVER: &str = "7z";

/// pg_dump output format, parsed from the `FORMAT` code
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DumpFormat {
    /// `c`: custom archive
    Custom,
    /// `d`: directory archive
    Directory,
    /// `t`: tar archive
    Tar,
    /// `p`: plain SQL script
    Plain,
    /// No format configured; pg_dump falls back to plain
    #[default]
    Unspecified,
    /// Any other code, passed through to pg_dump untouched
    Other(String),
}

impl DumpFormat {
    /// Parse a format code
    pub fn from_code(code: &str) -> Self {
        match code {
            "c" => Self::Custom,
            "d" => Self::Directory,
            "t" => Self::Tar,
            "p" => Self::Plain,
            "" => Self::Unspecified,
            other => Self::Other(other.to_string()),
        }
    }

    /// The code handed to `pg_dump --format`
    pub fn code(&self) -> &str {
        match self {
            Self::Custom => "c",
            Self::Directory => "d",
            Self::Tar => "t",
            Self::Plain => "p",
            Self::Unspecified => "",
            Self::Other(code) => code,
        }
    }

    /// File extension of the artifact this format produces
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Custom | Self::Directory => "dump",
            Self::Tar => "tar",
            _ => "sql",
        }
    }
}

impl fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "(unset)"),
            other => write!(f, "{}", other.code()),
        }
    }
}

/// Settings for one backup run
#[derive(Clone, Default)]
pub struct Settings {
    /// `BACKUP_USER`: OS account expected to own the backups
    pub backup_user: String,

    /// `HOSTNAME`: database host
    pub hostname: String,

    /// `DBPORT`: database port, kept as text and passed through
    pub port: String,

    /// `USERDB`: role pg_dump connects as
    pub user: String,

    /// `PGPASSWORD`: handed to pg_dump through its environment only
    pub password: Zeroizing<String>,

    /// `DATABASE`: database to dump
    pub database: String,

    /// `BACKUP_DIR`: root holding the dated backup directories
    pub backup_dir: PathBuf,

    /// `SCHEMA_ONLY_LIST`
    pub schema_only_list: String,

    /// `ENABLE_CUSTOM_BACKUPS`
    pub enable_custom_backups: String,

    /// `ENABLE_PLAIN_BACKUPS`
    pub enable_plain_backups: String,

    /// `ENABLE_GLOBALS_BACKUPS`
    pub enable_globals_backups: String,

    /// `DAY_OF_WEEK_TO_KEEP`: weekday of the weekly backup (0 = Sunday)
    pub day_of_week_to_keep: i64,

    /// `DAYS_TO_KEEP`: keep window of daily backups
    pub days_to_keep: i64,

    /// `WEEKS_TO_KEEP`: keep window of weekly backups, in weeks
    pub weeks_to_keep: i64,

    /// `FORMAT`
    pub format: DumpFormat,

    /// `PG_DUMP_BIN`: dump program, `pg_dump` when unset
    pub pg_dump_bin: String,

    /// `ARCHIVER_BIN`: archiver program, `7z` when unset
    pub archiver_bin: String,
}

impl Settings {
    /// Load settings from a file
    ///
    /// A missing or unreadable file is a configuration error; nothing in
    /// the file itself can make loading fail.
    pub fn load(path: &Path) -> Result<Self, BackupError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BackupError::Config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self::parse(&contents))
    }

    /// Parse settings from the text of a settings file
    pub fn parse(contents: &str) -> Self {
        let mut settings = Settings::default();

        for line in contents.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            settings.apply(key.trim(), value.trim());
        }

        settings
    }

    /// Apply one recognized key; unknown keys are ignored
    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "BACKUP_USER" => self.backup_user = value.to_string(),
            "HOSTNAME" => self.hostname = value.to_string(),
            "DBPORT" => self.port = value.to_string(),
            "USERDB" => self.user = value.to_string(),
            "PGPASSWORD" => self.password = Zeroizing::new(value.to_string()),
            "DATABASE" => self.database = value.to_string(),
            "BACKUP_DIR" => self.backup_dir = PathBuf::from(value),
            "SCHEMA_ONLY_LIST" => self.schema_only_list = value.to_string(),
            "ENABLE_CUSTOM_BACKUPS" => self.enable_custom_backups = value.to_string(),
            "ENABLE_PLAIN_BACKUPS" => self.enable_plain_backups = value.to_string(),
            "ENABLE_GLOBALS_BACKUPS" => self.enable_globals_backups = value.to_string(),
            "DAY_OF_WEEK_TO_KEEP" => self.day_of_week_to_keep = parse_int(value),
            "DAYS_TO_KEEP" => self.days_to_keep = parse_int(value),
            "WEEKS_TO_KEEP" => self.weeks_to_keep = parse_int(value),
            "FORMAT" => self.format = DumpFormat::from_code(value),
            "PG_DUMP_BIN" => self.pg_dump_bin = value.to_string(),
            "ARCHIVER_BIN" => self.archiver_bin = value.to_string(),
            _ => {}
        }
    }

    /// Dump program to run
    pub fn pg_dump_program(&self) -> &str {
        if self.pg_dump_bin.is_empty() {
            DEFAULT_PG_DUMP
        } else {
            &self.pg_dump_bin
        }
    }

    /// Archiver program to run
    pub fn archiver_program(&self) -> &str {
        if self.archiver_bin.is_empty() {
            DEFAULT_ARCHIVER
        } else {
            &self.archiver_bin
        }
    }

    /// Whether a password was configured
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }
}

// The password never reaches logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("backup_user", &self.backup_user)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &if self.has_password() { "<redacted>" } else { "" })
            .field("database", &self.database)
            .field("backup_dir", &self.backup_dir)
            .field("schema_only_list", &self.schema_only_list)
            .field("enable_custom_backups", &self.enable_custom_backups)
            .field("enable_plain_backups", &self.enable_plain_backups)
            .field("enable_globals_backups", &self.enable_globals_backups)
            .field("day_of_week_to_keep", &self.day_of_week_to_keep)
            .field("days_to_keep", &self.days_to_keep)
            .field("weeks_to_keep", &self.weeks_to_keep)
            .field("format", &self.format)
            .field("pg_dump_bin", &self.pg_dump_program())
            .field("archiver_bin", &self.archiver_program())
            .finish()
    }
}

/// Parse an integer setting, defaulting to zero
fn parse_int(value: &str) -> i64 {
    value.parse().unwrap_or(0)
}
