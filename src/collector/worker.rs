//! Category collector
//!
//! One collector runs per enabled category per cycle. It queries the broker,
//! filters resources by name, resolves every configured attribute and appends
//! the resulting metrics to the shared buffer in one batch.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, error, info, instrument};

use super::barrier::BarrierGuard;
use super::category::{fetch, scope, Category, PathContext, ResourceSnapshot};
use super::filter::FilterConfig;
use super::mapper::resolve_value;
use super::metric::{CategorySpec, CollectedMetric, MetricBuffer};
use super::path::build_path;
use crate::admin::AdminConnection;
use crate::error::AdminError;

/// Result of one category within a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    /// Query succeeded; number of metrics appended
    Collected(usize),
    /// Query failed or timed out; nothing appended
    Failed(String),
}

impl CategoryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, CategoryOutcome::Failed(_))
    }
}

/// Outcomes recorded by the collectors of one cycle
#[derive(Debug, Clone, Default)]
pub struct OutcomeLog {
    inner: Arc<Mutex<BTreeMap<Category, CategoryOutcome>>>,
}

impl OutcomeLog {
    pub fn record(&self, category: Category, outcome: CategoryOutcome) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(category, outcome);
    }

    pub fn snapshot(&self) -> BTreeMap<Category, CategoryOutcome> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Collector for a single category
pub struct CategoryCollector {
    connection: Arc<dyn AdminConnection>,
    filter: FilterConfig,
    spec: CategorySpec,
    global_prefix: String,
    category_prefix: Option<String>,
    ctx: PathContext,
    buffer: MetricBuffer,
    outcomes: OutcomeLog,
    timeout: Duration,
    // arrives when the collector is dropped, on every exit path
    _guard: BarrierGuard,
}

impl CategoryCollector {
    /// 새 collector 생성
    ///
    /// `guard` must be registered before the collector is spawned.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        connection: Arc<dyn AdminConnection>,
        filter: FilterConfig,
        spec: CategorySpec,
        global_prefix: String,
        ctx: PathContext,
        buffer: MetricBuffer,
        outcomes: OutcomeLog,
        timeout: Duration,
        guard: BarrierGuard,
    ) -> Self {
        let category_prefix = spec.resolved_prefix();
        Self {
            connection,
            filter,
            spec,
            global_prefix,
            category_prefix,
            ctx,
            buffer,
            outcomes,
            timeout,
            _guard: guard,
        }
    }

    pub fn category(&self) -> Category {
        self.spec.category
    }

    /// Run the collection; consumes the collector and releases its guard
    #[instrument(skip(self), fields(category = %self.spec.category))]
    pub async fn run(self) -> CategoryOutcome {
        let category = self.spec.category;
        debug!("Collecting category");

        let query = fetch(category, self.connection.as_ref());
        let outcome = match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(snapshots)) => {
                let metrics = self.build_metrics(&snapshots);
                let count = metrics.len();
                self.buffer.extend(metrics);
                debug!(
                    resources = snapshots.len(),
                    metrics = count,
                    "Category collected"
                );
                CategoryOutcome::Collected(count)
            }
            Ok(Err(e)) => {
                error!(error = %e, "Error while collecting category metrics");
                CategoryOutcome::Failed(e.to_string())
            }
            Err(_) => {
                let e = AdminError::timeout_with_duration(self.timeout.as_millis() as u64);
                error!(error = %e, "Category query timed out");
                CategoryOutcome::Failed(e.to_string())
            }
        };

        self.outcomes.record(category, outcome.clone());
        outcome
    }

    fn build_metrics(&self, snapshots: &[ResourceSnapshot]) -> Vec<CollectedMetric> {
        let category = self.spec.category;
        let mut metrics = Vec::new();

        for snapshot in snapshots {
            if category.is_name_filtered() && !self.filter.allows(snapshot.filter_name()) {
                debug!(name = ?snapshot.filter_name(), "Skipping filtered resource");
                continue;
            }

            let (category_prefix, segment) =
                scope(snapshot, self.category_prefix.as_deref(), &self.ctx);

            for def in &self.spec.metrics {
                let Some(value) = resolve_value(snapshot, &def.attr) else {
                    info!(
                        attr = %def.attr,
                        resource = ?snapshot.filter_name(),
                        "Attribute unknown or not reported, skipping"
                    );
                    continue;
                };

                let name = def.display_name();
                let full_path = build_path(
                    &self.global_prefix,
                    category_prefix.as_deref(),
                    segment.as_deref(),
                    name,
                );

                metrics.push(CollectedMetric {
                    name: name.to_string(),
                    value: value.to_string(),
                    full_path,
                    properties: def.properties(),
                });
            }
        }

        metrics
    }
}
