//! Collection coordinator
//!
//! Runs one collection cycle against one broker: probes the connection,
//! fans out one collector task per enabled category and harvests the shared
//! buffer once every collector has arrived at the barrier.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument};

use super::barrier::JoinBarrier;
use super::category::{Category, PathContext, QueueTopicPrefixIndex};
use super::filter::FilterConfig;
use super::metric::{CategorySpec, CollectedMetric, MetricBuffer};
use super::path::metric_prefix;
use super::worker::{CategoryCollector, CategoryOutcome, OutcomeLog};
use crate::admin::AdminConnection;
use crate::error::CollectError;

/// Default per-category query timeout
pub const DEFAULT_CATEGORY_TIMEOUT: Duration = Duration::from_secs(30);

/// Coordinator settings
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Put producer/consumer ids into their metric paths
    pub display_dynamic_ids_in_metric_path: bool,
    /// Upper bound on one category's broker query
    pub category_timeout: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            display_dynamic_ids_in_metric_path: false,
            category_timeout: DEFAULT_CATEGORY_TIMEOUT,
        }
    }
}

/// Summary of one cycle
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub outcomes: BTreeMap<Category, CategoryOutcome>,
    pub duration: Duration,
    pub metric_count: usize,
}

impl CycleReport {
    /// Categories whose query failed this cycle
    pub fn failed_categories(&self) -> Vec<Category> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_failed())
            .map(|(c, _)| *c)
            .collect()
    }
}

/// Fan-out collection engine
#[derive(Debug, Clone, Default)]
pub struct CollectionCoordinator {
    settings: CollectorSettings,
}

impl CollectionCoordinator {
    pub fn new(settings: CollectorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Collect every enabled category of one broker
    ///
    /// Only a failed connection probe fails the cycle. A category whose
    /// query fails contributes no metrics; the others are unaffected.
    pub async fn collect(
        &self,
        connection: Arc<dyn AdminConnection>,
        specs: &[CategorySpec],
        filters: &HashMap<Category, FilterConfig>,
        global_prefix: &str,
        display_name: Option<&str>,
    ) -> Result<Vec<CollectedMetric>, CollectError> {
        self.collect_with_report(connection, specs, filters, global_prefix, display_name)
            .await
            .map(|(metrics, _)| metrics)
    }

    /// [`collect`](Self::collect) plus a per-category report
    #[instrument(skip_all, fields(broker = display_name.unwrap_or("-")))]
    pub async fn collect_with_report(
        &self,
        connection: Arc<dyn AdminConnection>,
        specs: &[CategorySpec],
        filters: &HashMap<Category, FilterConfig>,
        global_prefix: &str,
        display_name: Option<&str>,
    ) -> Result<(Vec<CollectedMetric>, CycleReport), CollectError> {
        let start = Instant::now();

        if let Err(e) = connection.server_info().await {
            error!(error = %e, "Broker connection probe failed, skipping cycle");
            return Err(CollectError::Connection(e));
        }

        let enabled: Vec<&CategorySpec> = specs.iter().filter(|s| s.enabled).collect();

        let ctx = PathContext {
            prefixes: Arc::new(QueueTopicPrefixIndex::from_specs(specs)),
            display_dynamic_ids: self.settings.display_dynamic_ids_in_metric_path,
        };
        let prefix = metric_prefix(global_prefix, display_name);
        let buffer = MetricBuffer::new();
        let outcomes = OutcomeLog::default();
        let barrier = JoinBarrier::new();

        // coordinator membership keeps the barrier closed while spawning
        let own = barrier.register();

        for spec in &enabled {
            let filter = filters.get(&spec.category).cloned().unwrap_or_default();
            let collector = CategoryCollector::new(
                Arc::clone(&connection),
                filter,
                (*spec).clone(),
                prefix.clone(),
                ctx.clone(),
                buffer.clone(),
                outcomes.clone(),
                self.settings.category_timeout,
                barrier.register(),
            );

            debug!(category = %spec.category, "Spawning collector");
            tokio::spawn(collector.run());
        }

        drop(own);
        barrier.wait().await;

        let mut report_outcomes = outcomes.snapshot();
        for spec in &enabled {
            report_outcomes
                .entry(spec.category)
                .or_insert_with(|| CategoryOutcome::Failed("collector aborted".to_string()));
        }

        let metrics = buffer.take();
        let report = CycleReport {
            outcomes: report_outcomes,
            duration: start.elapsed(),
            metric_count: metrics.len(),
        };

        info!(
            categories = enabled.len(),
            failed = report.failed_categories().len(),
            metrics = metrics.len(),
            duration_ms = report.duration.as_millis() as u64,
            "Collection cycle complete"
        );

        Ok((metrics, report))
    }
}
