//! Periodic collection driver
//!
//! Builds one admin client per configured broker at startup and runs a
//! collection cycle for every broker on each tick. Brokers are collected
//! concurrently; one broker failing does not affect the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

use crate::admin::{AdminConnection, HttpAdminClient};
use crate::collector::{Category, CollectedMetric, CollectionCoordinator, FilterConfig};
use crate::config::{BrokerConfig, Config};
use crate::error::{AppResult, CollectError};
use crate::metrics::InternalMetrics;
use crate::sink::MetricStore;

/// One broker and everything needed to collect from it
pub struct BrokerTarget {
    /// Label used in logs, self-metrics and the store
    pub label: String,
    pub display_name: Option<String>,
    pub connection: Arc<dyn AdminConnection>,
    pub filters: HashMap<Category, FilterConfig>,
}

impl BrokerTarget {
    /// Build a target with an HTTP admin client
    ///
    /// # Errors
    /// Fails on unresolvable credentials or an invalid admin URL/TLS setup
    pub fn from_config(broker: &BrokerConfig, config: &Config) -> AppResult<Self> {
        let password = broker.resolve_password()?;

        let tls = broker.tls_options()?;
        let mut client = HttpAdminClient::with_tls(&broker.admin_url(), broker.timeout_ms, &tls)?;
        if let Some(user) = broker.user.as_deref().filter(|u| !u.is_empty()) {
            client = client.with_auth(user, &password);
        }

        Ok(Self::new(broker, config, Arc::new(client)))
    }

    /// Build a target around an existing connection
    pub fn new(broker: &BrokerConfig, config: &Config, connection: Arc<dyn AdminConnection>) -> Self {
        Self {
            label: broker.label(),
            display_name: broker.display_name().map(str::to_string),
            connection,
            filters: broker.category_filters(
                config.metrics.show_system,
                config.metrics.show_temp,
                config.filter_mode,
            ),
        }
    }
}

/// Outcome of one broker's cycle
pub type BrokerResult = (String, Result<Vec<CollectedMetric>, CollectError>);

/// Drives collection cycles for every broker
pub struct Scheduler {
    config: Arc<Config>,
    coordinator: CollectionCoordinator,
    targets: Vec<Arc<BrokerTarget>>,
    store: MetricStore,
    internal: InternalMetrics,
}

impl Scheduler {
    /// Create a scheduler with HTTP admin clients for every configured broker
    ///
    /// # Errors
    /// Credential and client setup errors are fatal here, before any cycle runs
    pub fn from_config(
        config: Arc<Config>,
        store: MetricStore,
        internal: InternalMetrics,
    ) -> AppResult<Self> {
        let targets = config
            .brokers
            .iter()
            .map(|b| BrokerTarget::from_config(b, &config).map(Arc::new))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self::with_targets(config, targets, store, internal))
    }

    /// Create a scheduler over prepared targets
    pub fn with_targets(
        config: Arc<Config>,
        targets: Vec<Arc<BrokerTarget>>,
        store: MetricStore,
        internal: InternalMetrics,
    ) -> Self {
        let coordinator = CollectionCoordinator::new(config.collector_settings());
        Self {
            config,
            coordinator,
            targets,
            store,
            internal,
        }
    }

    pub fn targets(&self) -> &[Arc<BrokerTarget>] {
        &self.targets
    }

    /// Run one cycle for every broker concurrently
    pub async fn run_once(&self) -> Vec<BrokerResult> {
        let handles: Vec<_> = self
            .targets
            .iter()
            .map(|target| {
                let target = Arc::clone(target);
                let config = Arc::clone(&self.config);
                let coordinator = self.coordinator.clone();
                let store = self.store.clone();
                let internal = self.internal.clone();
                tokio::spawn(async move {
                    let result = cycle(&coordinator, &config, &target, &store, &internal).await;
                    (target.label.clone(), result)
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => error!(error = %e, "Broker cycle task failed"),
            }
        }
        results
    }

    /// Run cycles forever at the configured interval
    pub async fn run(self) {
        let interval = Duration::from_secs(self.config.interval_secs);
        info!(
            brokers = self.targets.len(),
            interval_secs = self.config.interval_secs,
            "Starting collection scheduler"
        );

        if self.targets.is_empty() {
            warn!("No brokers configured, nothing to collect");
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }
}

#[instrument(skip_all, fields(broker = %target.label))]
async fn cycle(
    coordinator: &CollectionCoordinator,
    config: &Config,
    target: &BrokerTarget,
    store: &MetricStore,
    internal: &InternalMetrics,
) -> Result<Vec<CollectedMetric>, CollectError> {
    let start = Instant::now();

    let result = coordinator
        .collect_with_report(
            Arc::clone(&target.connection),
            &config.metrics.categories,
            &target.filters,
            &config.metric_prefix,
            target.display_name.as_deref(),
        )
        .await;

    match result {
        Ok((metrics, report)) => {
            internal.record_cycle(&target.label, &report);
            for category in report.failed_categories() {
                warn!(category = %category, "Category produced no metrics this cycle");
            }
            store.replace(&target.label, metrics.clone());
            Ok(metrics)
        }
        Err(e) => {
            error!(error = %e, "Collection cycle failed");
            internal.record_cycle_failure(&target.label, start.elapsed().as_secs_f64());
            store.clear(&target.label);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerConfig;
    use crate::error::AppError;

    #[test]
    fn test_missing_encryption_key_is_fatal() {
        let mut config = Config::default();
        config.brokers = vec![BrokerConfig {
            encrypted_password: Some("c2VjcmV0c2VjcmV0c2VjcmV0".to_string()),
            ..Default::default()
        }];
        let config = Arc::new(config);

        let result = Scheduler::from_config(config, MetricStore::new(), InternalMetrics::new());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_targets_built_per_broker() {
        let mut config = Config::default();
        config.brokers = vec![
            BrokerConfig {
                display_name: Some("A".to_string()),
                user: Some("admin".to_string()),
                ..Default::default()
            },
            BrokerConfig {
                display_name: Some("B".to_string()),
                port: 7243,
                ..Default::default()
            },
        ];

        let scheduler =
            Scheduler::from_config(Arc::new(config), MetricStore::new(), InternalMetrics::new())
                .unwrap();
        let labels: Vec<&str> = scheduler.targets().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[test]
    fn test_invalid_admin_url_is_fatal() {
        let mut config = Config::default();
        config.brokers = vec![BrokerConfig {
            url: Some("not a url".to_string()),
            ..Default::default()
        }];

        let result =
            Scheduler::from_config(Arc::new(config), MetricStore::new(), InternalMetrics::new());
        assert!(matches!(result, Err(AppError::Admin(_))));
    }
}
