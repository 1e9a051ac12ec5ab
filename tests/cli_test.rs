//! CLI integration tests
//!
//! Tests for the command-line interface using assert_cmd.
//!
//! These tests verify:
//! - Help and version flags
//! - Configuration validation
//! - Password encryption helper
//! - Error handling for missing files

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get a command for the rems-monitor binary
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("rems-monitor").expect("Failed to find rems-monitor binary");
    cmd.env_remove("REMS_ENCRYPTION_KEY")
        .env_remove("REMS_PORT")
        .env_remove("REMS_CONFIG");
    cmd
}

/// Helper to create a temporary config file with given content
fn create_temp_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file.flush().expect("Failed to flush");
    file
}

const VALID_CONFIG: &str = r#"
metric_prefix: "Custom Metrics|EMS"
interval_secs: 30

server:
  port: 19595
  path: "/metrics"

brokers:
  - display_name: "EMS-1"
    host: "localhost"
    port: 7222
    user: "admin"
    password: ""
    include_queues: [".*"]

metrics:
  categories:
    - type: Server
      metrics:
        - attr: ConnectionCount
    - type: Queue
      metric_prefix: "Queues"
      metrics:
        - attr: PendingMessageCount
          alias: Pending
          aggregation_type: SUM
    - type: Topic
      enabled: false
"#;

/// Test --help flag displays usage information
#[test]
fn test_help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:").or(predicate::str::contains("usage:")))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--once"));
}

/// Test -h short flag also works
#[test]
fn test_help_short_flag() {
    cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("rems-monitor"));
}

/// Test --version flag displays version
#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Test that a valid configuration is accepted via --validate flag
#[test]
fn test_validate_valid_config() {
    let file = create_temp_config(VALID_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("brokers: 1"))
        .stdout(predicate::str::contains("Server, Queue"));
}

/// Test that a missing config file is an error with --validate
#[test]
fn test_validate_missing_file() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that invalid YAML is rejected
#[test]
fn test_validate_invalid_yaml() {
    let file = create_temp_config("brokers: [not valid yaml\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that an unknown category type is rejected
#[test]
fn test_unknown_category_type() {
    let config = r#"
metrics:
  categories:
    - type: Bridge
"#;
    let file = create_temp_config(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that invalid port (0) is rejected
#[test]
fn test_invalid_port_zero() {
    let config = r#"
server:
  port: 0
"#;
    let file = create_temp_config(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure();
}

/// Test conflicting metrics path with health endpoint
#[test]
fn test_metrics_path_conflict_with_health() {
    let config = r#"
server:
  port: 9595
  path: "/health"
"#;
    let file = create_temp_config(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that several brokers need distinct display names
#[test]
fn test_duplicate_broker_display_names() {
    let config = r#"
brokers:
  - display_name: "EMS"
    port: 7222
  - display_name: "EMS"
    port: 7223
"#;
    let file = create_temp_config(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that port can be overridden via CLI
#[test]
fn test_port_override() {
    let file = create_temp_config(VALID_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("-p")
        .arg("19999")
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.0.0.0:19999/metrics"));
}

/// Test environment variable override for port
#[test]
fn test_env_port_override() {
    let file = create_temp_config(VALID_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .env("REMS_PORT", "19092")
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains(":19092/metrics"));
}

/// Test that an override producing an invalid config is rejected
#[test]
fn test_metrics_path_override_conflict() {
    let file = create_temp_config(VALID_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--metrics-path")
        .arg("/")
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that an encrypted password without a key is rejected at startup
#[test]
fn test_encrypted_password_without_key() {
    let config = r#"
brokers:
  - display_name: "EMS"
    user: "admin"
    encrypted_password: "c2VjcmV0c2VjcmV0c2VjcmV0"
"#;
    let file = create_temp_config(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--once")
        .timeout(std::time::Duration::from_secs(5))
        .assert()
        .failure();
}

/// Test --encrypt-password prints a ciphertext that differs from the input
#[test]
fn test_encrypt_password() {
    cmd()
        .arg("--encrypt-password")
        .arg("secret")
        .arg("--encryption-key")
        .arg("my-key")
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not())
        .stdout(predicate::str::contains("secret").not());
}

/// Test --encrypt-password without a key fails
#[test]
fn test_encrypt_password_requires_key() {
    cmd()
        .arg("--encrypt-password")
        .arg("secret")
        .assert()
        .failure();
}

/// Test --once against an unreachable broker exits with an error
#[test]
fn test_once_unreachable_broker() {
    let config = r#"
brokers:
  - display_name: "EMS"
    url: "http://127.0.0.1:1"
    timeout_ms: 500
metrics:
  categories:
    - type: Server
      metrics:
        - attr: ConnectionCount
"#;
    let file = create_temp_config(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--once")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure();
}
