//! Integration tests for the `mqtt-remote` binary entry point.
//!
//! Covers argument parsing and the user-facing errors raised before any
//! broker connection is attempted.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

#[test]
fn help_lists_configuration_flags() {
    let mut command = cargo_bin_cmd!("mqtt-remote");
    command.arg("--help");
    command
        .assert()
        .success()
        .stdout(contains("--config"))
        .stdout(contains("--log-filter"));
}

#[test]
fn missing_configuration_file_exits_with_failure() {
    let dir = TempDir::new().expect("temp dir");
    let mut command = cargo_bin_cmd!("mqtt-remote");
    command
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .env_remove("MQTT_REMOTE_CONFIG");
    command
        .assert()
        .failure()
        .stderr(contains("failed to load configuration"));
}

#[test]
fn unsupported_protocol_exits_with_failure() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.yaml");
    fs::write(
        &path,
        "broker:\n  host: localhost\nsession:\n  client_id: pc\n  protocol: \"5\"\nlogging:\n  format: compact\n",
    )
    .expect("write config");

    let mut command = cargo_bin_cmd!("mqtt-remote");
    command.env("MQTT_REMOTE_CONFIG", &path);
    command
        .assert()
        .failure()
        .stderr(contains("MQTT protocol 5 is not supported"));
}
