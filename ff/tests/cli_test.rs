//! Command-line tests for the ff binary
//!
//! Logs go to a temp data dir and the working directory is a temp dir, so no
//! user config or log file is touched.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DEPLOYED: &str = r#"
rpc:
  url: http://127.0.0.1:9
  timeout-ms: 1000
  max-retries: 0
  initial-backoff-ms: 1
deployment:
  game: "0x00000000000000000000000000000000000000aa"
  inventory: "0x00000000000000000000000000000000000000bb"
throttle:
  game-data:
    interval-ms: 0
  cards:
    interval-ms: 0
"#;

fn ff(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ff").unwrap();
    cmd.current_dir(home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, name: &str, yaml: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, yaml).unwrap();
    path.display().to_string()
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    ff(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("deck"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_prints_defaults() {
    let home = TempDir::new().unwrap();
    ff(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("url: \"http://localhost:8545\""))
        .stdout(predicate::str::contains("game-data: 300"));
}

#[test]
fn test_config_reads_explicit_file() {
    let home = TempDir::new().unwrap();
    let path = write_config(home.path(), "custom.yml", "poll:\n  interval-ms: 1234\n");

    ff(&home)
        .args(["config", "-c", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("interval-ms: 1234"));
}

#[test]
fn test_config_reads_project_local_file() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), ".fable.yml", "rpc:\n  url: https://local.example\n");

    ff(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://local.example"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let home = TempDir::new().unwrap();
    ff(&home)
        .args(["config", "-c", "does-not-exist.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_watch_requires_deployment() {
    let home = TempDir::new().unwrap();
    ff(&home)
        .args(["watch", "1", "--polls", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("deployment.game"));
}

#[test]
fn test_watch_rejects_bad_game_id() {
    let home = TempDir::new().unwrap();
    ff(&home).args(["watch", "forty-two"]).assert().failure();
}

#[test]
fn test_deck_rejects_bad_address() {
    let home = TempDir::new().unwrap();
    ff(&home)
        .args(["deck", "0x1234", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0x1234"));
}

#[test]
fn test_watch_reports_unreachable_node() {
    let home = TempDir::new().unwrap();
    let path = write_config(home.path(), "deployed.yml", DEPLOYED);

    ff(&home)
        .args(["watch", "42", "--polls", "1", "--poll-ms", "10", "-c", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("Watching game"))
        .stdout(predicate::str::contains("game-data"))
        .stdout(predicate::str::contains("Network error"))
        .stdout(predicate::str::contains("0 updates, 0 unchanged, 2 failures"));
}

#[test]
fn test_deck_reports_unreachable_node() {
    let home = TempDir::new().unwrap();
    let path = write_config(home.path(), "deployed.yml", DEPLOYED);

    ff(&home)
        .args(["deck", "0x00000000000000000000000000000000000000cc", "1", "-c", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read deck 1"));
}

#[test]
fn test_log_file_written() {
    let home = TempDir::new().unwrap();
    ff(&home).args(["--log-level", "debug", "config"]).assert().success();

    let log = fs::read_to_string(home.path().join("data").join("fable").join("logs").join("ff.log")).unwrap();
    assert!(log.contains("Logging initialized"));
    assert!(log.contains("cmd_config: called"));
}
