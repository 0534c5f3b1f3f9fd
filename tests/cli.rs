use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nexus-backup").unwrap();
    cmd.env("NEXUS_BACKUP_DATA_DIR", config_dir)
        .env("RUST_LOG", "warn");
    cmd
}

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        fs::create_dir_all(source.join("node_modules")).unwrap();
        fs::write(source.join("a.txt"), b"0123456789").unwrap();
        fs::write(source.join("node_modules/x.txt"), b"12345").unwrap();
        Self { temp }
    }

    fn config_dir(&self) -> std::path::PathBuf {
        self.temp.path().join("config")
    }

    fn source(&self) -> std::path::PathBuf {
        self.temp.path().join("source")
    }

    fn destination(&self) -> std::path::PathBuf {
        self.temp.path().join("backups")
    }

    fn configure(&self, extra: &[&str]) {
        cmd(&self.config_dir())
            .args(["config", "set", "--source"])
            .arg(self.source())
            .arg("--destination")
            .arg(self.destination())
            .args(["--excludes", "node_modules"])
            .args(extra)
            .assert()
            .success()
            .stdout(predicate::str::contains("Settings saved"));
    }

    fn snapshot_dirs(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.destination())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with("Backup_"))
            .collect();
        names.sort();
        names
    }
}

#[test]
fn test_no_command_prints_hint() {
    let ws = Workspace::new();
    cmd(&ws.config_dir())
        .assert()
        .success()
        .stdout(predicate::str::contains("nexus-backup --help"));
}

#[test]
fn test_config_show_defaults() {
    let ws = Workspace::new();
    cmd(&ws.config_dir())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"maxBackups\": 10"))
        .stdout(predicate::str::contains("node_modules, .git, temp"));
}

#[test]
fn test_config_set_and_get() {
    let ws = Workspace::new();
    ws.configure(&["--max-backups", "4"]);

    cmd(&ws.config_dir())
        .args(["config", "get", "maxBackups"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4"));

    assert!(ws.config_dir().join("settings.json").exists());
}

#[test]
fn test_config_set_rejects_zero_interval() {
    let ws = Workspace::new();
    cmd(&ws.config_dir())
        .args(["config", "set", "--interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval"));
}

#[test]
fn test_snapshot_without_configuration_fails() {
    let ws = Workspace::new();
    cmd(&ws.config_dir())
        .arg("snapshot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source or Destination not set"));
}

#[test]
fn test_snapshot_copies_filtered_tree() {
    let ws = Workspace::new();
    ws.configure(&[]);

    cmd(&ws.config_dir())
        .arg("snapshot")
        .assert()
        .success()
        .stdout(predicate::str::contains("Snapshot created"))
        .stdout(predicate::str::contains("Size: 10 B"));

    let names = ws.snapshot_dirs();
    assert_eq!(names.len(), 1);
    let snapshot = ws.destination().join(&names[0]);
    assert!(snapshot.join("a.txt").is_file());
    assert!(!snapshot.join("node_modules").exists());
}

#[test]
fn test_list_and_prune() {
    let ws = Workspace::new();
    ws.configure(&["--max-backups", "2"]);
    for name in [
        "Backup_2024-01-01_00-00-00",
        "Backup_2024-01-02_00-00-00",
        "Backup_2024-01-03_00-00-00",
    ] {
        fs::create_dir_all(ws.destination().join(name)).unwrap();
    }

    cmd(&ws.config_dir())
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 3 snapshot(s)"));

    // Preview only
    cmd(&ws.config_dir())
        .arg("prune")
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));
    assert_eq!(ws.snapshot_dirs().len(), 3);

    cmd(&ws.config_dir())
        .args(["prune", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 snapshot(s)"));
    assert_eq!(
        ws.snapshot_dirs(),
        vec!["Backup_2024-01-02_00-00-00", "Backup_2024-01-03_00-00-00"]
    );
}

#[test]
fn test_config_set_sends_saved_notification() {
    let ws = Workspace::new();
    cmd(&ws.config_dir())
        .env("RUST_LOG", "info")
        .args(["config", "set", "--max-backups", "3"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Configuration Saved"));
}

#[test]
fn test_run_console_status_when_idle() {
    let ws = Workspace::new();
    ws.configure(&[]);

    cmd(&ws.config_dir())
        .arg("run")
        .write_stdin("status\nquit\n")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("State: Idle"));
}

#[test]
fn test_run_console_force_then_quit() {
    let ws = Workspace::new();
    ws.configure(&[]);

    // Quit waits for the forced cycle to finish
    cmd(&ws.config_dir())
        .arg("run")
        .write_stdin("force\nquit\n")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup created at"));

    let names = ws.snapshot_dirs();
    assert_eq!(names.len(), 1);
    assert!(ws.destination().join(&names[0]).join("a.txt").is_file());
}

#[test]
fn test_run_console_set_changes_interval() {
    let ws = Workspace::new();
    ws.configure(&[]);

    cmd(&ws.config_dir())
        .args(["run", "--start"])
        .write_stdin("set interval=5\nstatus\nquit\n")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Setting 'interval' updated."))
        .stdout(predicate::str::contains("Interval: 5 min"));

    cmd(&ws.config_dir())
        .args(["config", "get", "interval"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5"));
}
