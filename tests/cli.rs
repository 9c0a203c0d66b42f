//! End-to-end tests of the pgbackup binary
//!
//! pg_dump and 7z are replaced by small shell scripts, so these only run
//! on Unix.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const FAKE_PG_DUMP: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
    case "$1" in
        -f) out="$2"; shift 2 ;;
        *) shift ;;
    esac
done
if [ -z "$PGPASSWORD" ]; then
    echo "pg_dump: error: no password supplied" >&2
    exit 1
fi
echo "-- dump" > "$out"
"#;

const BROKEN_PG_DUMP: &str = "#!/bin/sh\necho 'pg_dump: error: connection refused' >&2\nexit 1\n";

const FAKE_7Z: &str = "#!/bin/sh\ncp \"$4\" \"$3\"\n";

const BROKEN_7Z: &str = "#!/bin/sh\necho 'ERROR: disk full' >&2\nexit 2\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("backups")).unwrap();
        Self { dir }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("backups")
    }

    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Write a settings file; day 9 never matches, so every run is daily
    fn config(&self, format: &str, pg_dump: &Path, archiver: &Path) -> PathBuf {
        let path = self.dir.path().join("pgbackup.cfg");
        let contents = format!(
            "# test settings\n\
             HOSTNAME=localhost\n\
             DBPORT=5432\n\
             USERDB=backup\n\
             PGPASSWORD=hunter2\n\
             DATABASE=orders\n\
             BACKUP_DIR={}\n\
             DAY_OF_WEEK_TO_KEEP=9\n\
             DAYS_TO_KEEP=7\n\
             WEEKS_TO_KEEP=4\n\
             FORMAT={}\n\
             PG_DUMP_BIN={}\n\
             ARCHIVER_BIN={}\n",
            self.root().display(),
            format,
            pg_dump.display(),
            archiver.display()
        );
        fs::write(&path, contents).unwrap();
        path
    }

    fn working_config(&self, format: &str) -> PathBuf {
        let pg_dump = self.script("pg_dump", FAKE_PG_DUMP);
        let archiver = self.script("7z", FAKE_7Z);
        self.config(format, &pg_dump, &archiver)
    }

    /// The single destination directory a run created
    fn destination(&self) -> PathBuf {
        let dirs: Vec<PathBuf> = fs::read_dir(self.root())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().ends_with("-daily"))
            .collect();
        assert_eq!(dirs.len(), 1, "expected one daily directory, got {:?}", dirs);
        dirs.into_iter().next().unwrap()
    }
}

fn pgbackup() -> Command {
    let mut cmd = Command::cargo_bin("pgbackup").unwrap();
    cmd.env_remove("PGBACKUP_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn tar_backup_is_compressed() {
    let fixture = Fixture::new();
    let config = fixture.working_config("t");

    pgbackup()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup created"));

    assert_eq!(files_in(&fixture.destination()), vec!["orders.tar.7z"]);
}

#[test]
fn plain_backup_gets_dated_archive() {
    let fixture = Fixture::new();
    let config = fixture.working_config("p");

    pgbackup().arg("--config").arg(&config).assert().success();

    let destination = fixture.destination();
    let dir_name = destination.file_name().unwrap().to_string_lossy().to_string();
    let date = &dir_name[..10];
    assert_eq!(files_in(&destination), vec![format!("orders_{}.7z", date)]);
}

#[test]
fn custom_backup_is_left_alone() {
    let fixture = Fixture::new();
    let config = fixture.working_config("c");

    pgbackup().arg("--config").arg(&config).assert().success();

    assert_eq!(files_in(&fixture.destination()), vec!["orders.dump"]);
}

#[test]
fn config_from_environment() {
    let fixture = Fixture::new();
    let config = fixture.working_config("c");

    pgbackup()
        .env("PGBACKUP_CONFIG", &config)
        .arg("run")
        .assert()
        .success();

    assert_eq!(files_in(&fixture.destination()), vec!["orders.dump"]);
}

#[test]
fn dump_failure_exits_with_dump_code() {
    let fixture = Fixture::new();
    let pg_dump = fixture.script("pg_dump", BROKEN_PG_DUMP);
    let archiver = fixture.script("7z", FAKE_7Z);
    let config = fixture.config("c", &pg_dump, &archiver);

    pgbackup()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("connection refused"));

    // The destination was created before the dump failed and stays behind
    assert!(files_in(&fixture.destination()).is_empty());
}

#[test]
fn archiver_failure_keeps_artifact() {
    let fixture = Fixture::new();
    let pg_dump = fixture.script("pg_dump", FAKE_PG_DUMP);
    let archiver = fixture.script("7z", BROKEN_7Z);
    let config = fixture.config("t", &pg_dump, &archiver);

    pgbackup()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("disk full"));

    assert_eq!(files_in(&fixture.destination()), vec!["orders.tar"]);
}

#[test]
fn missing_config_exits_with_config_code() {
    let fixture = Fixture::new();

    pgbackup()
        .arg("--config")
        .arg(fixture.dir.path().join("absent.cfg"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn config_command_hides_password() {
    let fixture = Fixture::new();
    let config = fixture.working_config("c");

    pgbackup()
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database:        orders"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn json_report() {
    let fixture = Fixture::new();
    let config = fixture.working_config("t");

    let output = pgbackup()
        .arg("--config")
        .arg(&config)
        .args(["run", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["class"], "daily");
    assert_eq!(report["keep_days"], 7);
    assert_eq!(report["compression"]["original_removed"], true);
}

#[test]
fn prune_dry_run_keeps_expired_directories() {
    let fixture = Fixture::new();
    let config = fixture.working_config("c");

    let expired = fixture.root().join("2020-01-01-daily");
    fs::create_dir(&expired).unwrap();
    let long_ago = std::time::SystemTime::now() - std::time::Duration::from_secs(60 * 86_400);
    fs::File::open(&expired).unwrap().set_modified(long_ago).unwrap();

    pgbackup()
        .arg("--config")
        .arg(&config)
        .args(["prune", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2020-01-01-daily"));
    assert!(expired.exists());

    pgbackup()
        .arg("--config")
        .arg(&config)
        .arg("prune")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 deleted"));
    assert!(!expired.exists());
}

#[test]
fn prune_reports_unreadable_entries() {
    let fixture = Fixture::new();
    let config = fixture.working_config("c");

    let dangling = fixture.root().join("2020-01-01-daily");
    std::os::unix::fs::symlink(fixture.dir.path().join("gone"), &dangling).unwrap();

    pgbackup()
        .arg("--config")
        .arg(&config)
        .arg("prune")
        .assert()
        .success()
        .stdout(predicate::str::contains("problem"))
        .stdout(predicate::str::contains("2020-01-01-daily"))
        .stdout(predicate::str::contains("1 skipped"))
        .stdout(predicate::str::contains("Warning").not());
    assert!(fs::symlink_metadata(&dangling).is_ok());
}

#[test]
fn prune_warns_when_delete_fails() {
    let fixture = Fixture::new();
    let config = fixture.working_config("c");

    let locked = fixture.root().join("2020-01-01-daily");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("orders.dump"), "dump").unwrap();
    let long_ago = std::time::SystemTime::now() - std::time::Duration::from_secs(60 * 86_400);
    fs::File::open(&locked).unwrap().set_modified(long_ago).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o500)).unwrap();

    // Privileged users ignore directory permissions
    if fs::write(locked.join("write-check"), "x").is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let assert = pgbackup()
        .arg("--config")
        .arg(&config)
        .arg("prune")
        .assert();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("Warning: some expired backups could not be deleted"))
        .stdout(predicate::str::contains("1 failed"));
    assert!(locked.join("orders.dump").exists());
}
