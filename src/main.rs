use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pgbackup::cli::{handle_backup_command, BackupCommands};
use pgbackup::config::{paths::CONFIG_ENV_VAR, ConfigLocation, Settings};
use pgbackup::BackupResult;

#[derive(Parser)]
#[command(
    name = "pgbackup",
    author = "Kaylee Beyene",
    version,
    about = "Scheduled PostgreSQL backups with daily/weekly rotation",
    long_about = "pgbackup dumps a PostgreSQL database into a dated daily or weekly \
                  directory, deletes backups that have outlived their keep window \
                  and compresses tar and plain dumps with 7z. Run it from cron or \
                  any other scheduler; the exit code tells the scheduler which \
                  stage failed."
)]
struct Cli {
    /// Settings file (defaults to pgbackup.cfg next to the executable)
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<BackupCommands>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> BackupResult<()> {
    let location = ConfigLocation::resolve(cli.config)?;
    let settings = Settings::load(location.path())?;
    debug!(path = %location.path().display(), ?settings, "settings loaded");

    handle_backup_command(&location, &settings, cli.command.unwrap_or_default())
}

/// Log to stderr so `--json` output on stdout stays parseable
fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "pgbackup=debug" } else { "pgbackup=info" };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("could not initialize logging")
}
