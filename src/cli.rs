//! CLI argument parsing for rEMS-Monitor
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: config.yaml, env: REMS_CONFIG)
//! - `--port` / `-p`: Server port (overrides config file, env: REMS_PORT)
//! - `--bind-address`: Server bind address (env: REMS_BIND_ADDRESS)
//! - `--metrics-path`: Metrics endpoint path (env: REMS_METRICS_PATH)
//! - `--interval`: Seconds between collection cycles (env: REMS_INTERVAL)
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: REMS_LOG_LEVEL)
//! - `--log-format`: Log output format (text/json, env: REMS_LOG_FORMAT)
//! - `--validate`: Validate configuration without starting
//! - `--once`: Run one collection cycle, print the metrics and exit
//! - `--encrypt-password` / `--encryption-key`: Print an encrypted password for the config file
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;

/// rEMS-Monitor - Concurrent metrics collector for TIBCO EMS brokers
///
/// Collects server, destination, route, durable and connection statistics
/// from every configured broker and serves them over HTTP.
#[derive(Parser, Debug)]
#[command(name = "rems-monitor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.yaml",
        env = "REMS_CONFIG"
    )]
    pub config: PathBuf,

    /// Server port (overrides config file)
    #[arg(short, long, value_name = "PORT", env = "REMS_PORT")]
    pub port: Option<u16>,

    /// Server bind address (overrides config file)
    #[arg(long, value_name = "ADDRESS", env = "REMS_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Metrics endpoint path (overrides config file)
    #[arg(long, value_name = "PATH", env = "REMS_METRICS_PATH")]
    pub metrics_path: Option<String>,

    /// Seconds between collection cycles (overrides config file)
    #[arg(long, value_name = "SECS", env = "REMS_INTERVAL")]
    pub interval: Option<u64>,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "REMS_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "REMS_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Validate configuration without starting
    #[arg(long)]
    pub validate: bool,

    /// Run a single collection cycle, print the metrics and exit
    #[arg(long)]
    pub once: bool,

    /// Encrypt a broker password for use as `encrypted_password`
    #[arg(long, value_name = "PASSWORD", requires = "encryption_key")]
    pub encrypt_password: Option<String>,

    /// Key used with --encrypt-password
    #[arg(long, value_name = "KEY", env = "REMS_ENCRYPTION_KEY")]
    pub encryption_key: Option<String>,
}

impl Cli {
    /// Apply command-line overrides to a loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref bind_address) = self.bind_address {
            config.server.bind_address = bind_address.clone();
        }
        if let Some(ref path) = self.metrics_path {
            config.server.path = path.clone();
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output format
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// One JSON object per line
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["rems-monitor"]);
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert_eq!(cli.port, None);
        assert_eq!(cli.bind_address, None);
        assert_eq!(cli.metrics_path, None);
        assert_eq!(cli.interval, None);
        assert!(!cli.validate);
        assert!(!cli.once);
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.encrypt_password, None);
    }

    #[test]
    fn test_cli_with_options() {
        let cli = Cli::parse_from([
            "rems-monitor",
            "-c",
            "custom.yaml",
            "-p",
            "8080",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "--validate",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.yaml"));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.validate);
    }

    #[test]
    fn test_encrypt_password_requires_key() {
        let result = Cli::try_parse_from(["rems-monitor", "--encrypt-password", "secret"]);
        // the key may also come from REMS_ENCRYPTION_KEY
        if std::env::var("REMS_ENCRYPTION_KEY").is_err() {
            assert!(result.is_err());
        }

        let cli = Cli::parse_from([
            "rems-monitor",
            "--encrypt-password",
            "secret",
            "--encryption-key",
            "k",
        ]);
        assert_eq!(cli.encrypt_password.as_deref(), Some("secret"));
        assert_eq!(cli.encryption_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::parse_from([
            "rems-monitor",
            "-p",
            "9999",
            "--bind-address",
            "127.0.0.1",
            "--metrics-path",
            "/ems",
            "--interval",
            "15",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.path, "/ems");
        assert_eq!(config.interval_secs, 15);
    }
}
