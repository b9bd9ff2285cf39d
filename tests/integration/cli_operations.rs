//! Integration tests for the ruwc binary
//!
//! Every command runs with its config directories pointed at an empty temp
//! dir so a developer's own configuration cannot leak in.

use super::temp_file_with;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn ruwc(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ruwc").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_command() {
    let home = TempDir::new().unwrap();
    ruwc(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Count lines in very large files"));
}

#[test]
fn test_count_help() {
    let home = TempDir::new().unwrap();
    ruwc(&home)
        .args(["count", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--buffer-size"))
        .stdout(predicate::str::contains("--strategy"));
}

#[test]
fn test_version_command() {
    let home = TempDir::new().unwrap();
    ruwc(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ruwc"));
}

#[test]
fn test_version_json() {
    let home = TempDir::new().unwrap();
    ruwc(&home)
        .args(["--output-format", "json", "version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\":\"ruwc\""))
        .stdout(predicate::str::contains("\"version\""));
}

#[test]
fn test_count_human() {
    let home = TempDir::new().unwrap();
    let file = temp_file_with(b"a\nb\nc\n");
    ruwc(&home)
        .args(["count", "-t", "2", "-b", "2"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("3 "))
        .stdout(predicate::str::contains(file.path().to_string_lossy().as_ref()));
}

#[test]
fn test_count_alias_and_grouping() {
    let home = TempDir::new().unwrap();
    let file = temp_file_with(&b"x\n".repeat(1234));
    ruwc(&home)
        .arg("c")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1,234 "));
}

#[test]
fn test_count_minimal() {
    let home = TempDir::new().unwrap();
    let file = temp_file_with(b"one\ntwo\n");
    ruwc(&home)
        .args(["--output-format", "minimal", "count"])
        .arg(file.path())
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_count_json() {
    let home = TempDir::new().unwrap();
    let file = temp_file_with(&b"row\n".repeat(100));
    let output = ruwc(&home)
        .args(["--output-format", "json", "count", "--strategy", "polling", "-t", "3"])
        .arg(file.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["lines"], 100);
    assert_eq!(json["complete"], true);
    assert_eq!(json["bytes"], 400);
    assert_eq!(json["workers"], 3);
    assert_eq!(json["strategy"], "polling");
}

#[test]
fn test_verbose_summary_on_stderr() {
    let home = TempDir::new().unwrap();
    let file = temp_file_with(b"a\n");
    ruwc(&home)
        .args(["-v", "count"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1 "))
        .stderr(predicate::str::contains("Summary"));
}

#[test]
fn test_missing_file_exit_code() {
    let home = TempDir::new().unwrap();
    ruwc(&home)
        .args(["count", "does-not-exist.txt"])
        .assert()
        .code(66)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Failed to open"));
}

#[test]
fn test_invalid_buffer_size() {
    let home = TempDir::new().unwrap();
    ruwc(&home)
        .args(["count", "-b", "12Q", "file.txt"])
        .assert()
        .code(2);
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    let home = TempDir::new().unwrap();
    ruwc(&home).args(["-q", "-v", "version"]).assert().code(2);
}

#[test]
fn test_project_config_is_applied() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join(".ruwc.toml"), "[output]\nformat = \"minimal\"\n").unwrap();
    let file = temp_file_with(b"1\n2\n3\n4\n");

    ruwc(&home)
        .arg("count")
        .arg(file.path())
        .assert()
        .success()
        .stdout("4\n");
}

#[test]
fn test_explicit_config_and_cli_override() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    fs::write(&config, "[count]\nthreads = 1\nbuffer_size = \"4K\"\n\n[output]\nformat = \"json\"\n").unwrap();
    let file = temp_file_with(b"a\nb\n");

    let output = ruwc(&home)
        .arg("--config")
        .arg(&config)
        .args(["count", "-t", "2"])
        .arg(file.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["workers"], 2);
    assert_eq!(json["unit_capacity"], 4096);
}

#[test]
fn test_missing_explicit_config() {
    let home = TempDir::new().unwrap();
    ruwc(&home)
        .args(["--config", "nope.toml", "version"])
        .assert()
        .code(74)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_invalid_config_value() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join(".ruwc.toml"), "[count]\nbuffer_size = \"0\"\n").unwrap();
    ruwc(&home).arg("version").assert().code(78);
}

#[test]
fn test_completion_bash() {
    let home = TempDir::new().unwrap();
    ruwc(&home)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ruwc"));
}
