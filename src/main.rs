//! rEMS-Monitor - Concurrent metrics collector for TIBCO EMS brokers
//!
//! This binary runs the periodic collection scheduler and serves the
//! latest metrics over HTTP.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::info;

use rems_monitor::cli::Cli;
use rems_monitor::config::Config;
use rems_monitor::crypto;
use rems_monitor::metrics::InternalMetrics;
use rems_monitor::scheduler::Scheduler;
use rems_monitor::sink::{self, handlers::format_metrics, AppState, MetricStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref plain) = cli.encrypt_password {
        let key = cli
            .encryption_key
            .as_deref()
            .ok_or_else(|| anyhow!("--encryption-key is required with --encrypt-password"))?;
        println!("{}", crypto::encrypt_password(plain, key)?);
        return Ok(());
    }

    rems_monitor::init_logging(&cli.log_level.to_string(), cli.log_format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting rEMS-Monitor"
    );

    let mut config = if cli.validate {
        Config::load(&cli.config)?
    } else {
        Config::load_or_default(&cli.config)?
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    if cli.validate {
        println!("Configuration is valid");
        println!("  brokers: {}", config.brokers.len());
        println!(
            "  categories: {}",
            config
                .metrics
                .categories
                .iter()
                .filter(|c| c.enabled)
                .map(|c| c.category.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!(
            "  server: {}:{}{}",
            config.server.bind_address, config.server.port, config.server.path
        );
        return Ok(());
    }

    let config = Arc::new(config);
    let store = MetricStore::new();
    let internal = InternalMetrics::new();
    let scheduler = Scheduler::from_config(Arc::clone(&config), store.clone(), internal.clone())?;

    if cli.once {
        let mut failed = Vec::new();
        for (broker, result) in scheduler.run_once().await {
            match result {
                Ok(metrics) => print!("{}", format_metrics(&metrics)),
                Err(e) => failed.push(format!("{}: {}", broker, e)),
            }
        }

        if !failed.is_empty() {
            return Err(anyhow!("Collection failed for {}", failed.join("; ")));
        }
        return Ok(());
    }

    let collector = tokio::spawn(scheduler.run());

    let state = AppState {
        config,
        store,
        internal,
    };
    let result = sink::run(state).await;

    collector.abort();
    result
}
