//! Internal observability metrics for rEMS-Monitor
//!
//! Counters about the collector's own operation, appended to the sink output.
//!
//! # Metrics
//!
//! ## Per-broker metrics
//! - `rems_cycle_success_total{broker="..."}` - Counter of completed cycles
//! - `rems_cycle_failure_total{broker="..."}` - Counter of cycles aborted by a connection failure
//! - `rems_cycle_duration_seconds{broker="..."}` - Histogram of cycle durations
//! - `rems_metrics_collected{broker="..."}` - Metrics emitted by the last cycle
//!
//! ## Per-category metrics
//! - `rems_category_failure_total{broker="...",category="..."}` - Counter of failed category queries

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::collector::{Category, CycleReport};

/// Default histogram buckets for cycle duration (in seconds)
pub const DEFAULT_HISTOGRAM_BUCKETS: &[f64] = &[
    0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

/// Thread-safe counter using atomic operations
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter initialized to 0
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Increment the counter by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current value
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Thread-safe gauge using atomic operations
#[derive(Debug, Default)]
pub struct Gauge {
    /// Stored as bits of f64 for atomic operations
    value: AtomicU64,
}

impl Gauge {
    /// Create a new gauge initialized to 0
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    /// Set the gauge to a specific value
    pub fn set(&self, v: f64) {
        self.value.store(v.to_bits(), Ordering::Relaxed);
    }

    /// Get the current value
    pub fn get(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Relaxed))
    }
}

/// Thread-safe histogram for measuring distributions
#[derive(Debug)]
pub struct Histogram {
    /// Bucket boundaries (upper bounds)
    buckets: Vec<f64>,
    /// Bucket counters (count of observations <= bucket boundary)
    bucket_counts: Vec<AtomicU64>,
    /// Sum of all observed values
    sum: AtomicU64,
    /// Total count of observations
    count: AtomicU64,
}

impl Histogram {
    /// Create a new histogram with the given bucket boundaries
    pub fn new(buckets: &[f64]) -> Self {
        let mut sorted_buckets: Vec<f64> = buckets.to_vec();
        sorted_buckets.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        // Add +Inf bucket if not present
        if sorted_buckets
            .last()
            .map(|v| !v.is_infinite())
            .unwrap_or(true)
        {
            sorted_buckets.push(f64::INFINITY);
        }

        let bucket_counts = (0..sorted_buckets.len())
            .map(|_| AtomicU64::new(0))
            .collect();

        Self {
            buckets: sorted_buckets,
            bucket_counts,
            sum: AtomicU64::new(0.0_f64.to_bits()),
            count: AtomicU64::new(0),
        }
    }

    /// Create a histogram with default buckets for cycle durations
    pub fn with_default_buckets() -> Self {
        Self::new(DEFAULT_HISTOGRAM_BUCKETS)
    }

    /// Observe a value
    pub fn observe(&self, v: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);

        // atomic f64 add
        loop {
            let current = self.sum.load(Ordering::Relaxed);
            let new = f64::from_bits(current) + v;
            if self
                .sum
                .compare_exchange_weak(current, new.to_bits(), Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }

        for (i, &bound) in self.buckets.iter().enumerate() {
            if v <= bound {
                self.bucket_counts[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get the sum of all observations
    pub fn get_sum(&self) -> f64 {
        f64::from_bits(self.sum.load(Ordering::Relaxed))
    }

    /// Get the total count of observations
    pub fn get_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get bucket boundaries and their cumulative counts
    pub fn get_buckets(&self) -> Vec<(f64, u64)> {
        self.buckets
            .iter()
            .zip(self.bucket_counts.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::with_default_buckets()
    }
}

/// Per-broker metrics
#[derive(Debug, Default)]
pub struct BrokerMetrics {
    pub cycle_success_total: Counter,
    pub cycle_failure_total: Counter,
    pub cycle_duration_seconds: Histogram,
    pub metrics_collected: Gauge,
}

type BrokerMap = BTreeMap<String, Arc<BrokerMetrics>>;
type CategoryMap = BTreeMap<(String, Category), Arc<Counter>>;

/// Internal metrics registry
///
/// Cheap to clone; clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct InternalMetrics {
    brokers: Arc<RwLock<BrokerMap>>,
    categories: Arc<RwLock<CategoryMap>>,
}

impl InternalMetrics {
    /// Create a new internal metrics registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create metrics for a broker
    pub fn broker(&self, broker: &str) -> Arc<BrokerMetrics> {
        {
            let brokers = self.brokers.read().unwrap_or_else(|e| e.into_inner());
            if let Some(m) = brokers.get(broker) {
                return Arc::clone(m);
            }
        }

        let mut brokers = self.brokers.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(brokers.entry(broker.to_string()).or_default())
    }

    fn category_counter(&self, broker: &str, category: Category) -> Arc<Counter> {
        let key = (broker.to_string(), category);
        {
            let categories = self.categories.read().unwrap_or_else(|e| e.into_inner());
            if let Some(c) = categories.get(&key) {
                return Arc::clone(c);
            }
        }

        let mut categories = self.categories.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(categories.entry(key).or_default())
    }

    /// Record a completed cycle
    pub fn record_cycle(&self, broker: &str, report: &CycleReport) {
        let m = self.broker(broker);
        m.cycle_success_total.inc();
        m.cycle_duration_seconds.observe(report.duration.as_secs_f64());
        m.metrics_collected.set(report.metric_count as f64);

        for category in report.failed_categories() {
            self.category_counter(broker, category).inc();
        }
    }

    /// Record a cycle aborted before any category ran
    pub fn record_cycle_failure(&self, broker: &str, duration_secs: f64) {
        let m = self.broker(broker);
        m.cycle_failure_total.inc();
        m.cycle_duration_seconds.observe(duration_secs);
    }

    /// Failed queries recorded for one category of a broker
    pub fn category_failures(&self, broker: &str, category: Category) -> u64 {
        let categories = self.categories.read().unwrap_or_else(|e| e.into_inner());
        categories
            .get(&(broker.to_string(), category))
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Render all internal metrics in Prometheus text format
    pub fn format_prometheus(&self) -> String {
        let mut out = String::new();

        let brokers = self.brokers.read().unwrap_or_else(|e| e.into_inner());
        if !brokers.is_empty() {
            header(
                &mut out,
                "rems_cycle_success_total",
                "counter",
                "Completed collection cycles",
            );
            for (broker, m) in brokers.iter() {
                line(
                    &mut out,
                    "rems_cycle_success_total",
                    &[("broker", broker.as_str())],
                    m.cycle_success_total.get() as f64,
                );
            }

            header(
                &mut out,
                "rems_cycle_failure_total",
                "counter",
                "Cycles aborted by a connection failure",
            );
            for (broker, m) in brokers.iter() {
                line(
                    &mut out,
                    "rems_cycle_failure_total",
                    &[("broker", broker.as_str())],
                    m.cycle_failure_total.get() as f64,
                );
            }

            header(
                &mut out,
                "rems_cycle_duration_seconds",
                "histogram",
                "Histogram of cycle durations",
            );
            for (broker, m) in brokers.iter() {
                let histogram = &m.cycle_duration_seconds;
                for (bound, count) in histogram.get_buckets() {
                    let le = if bound.is_infinite() {
                        "+Inf".to_string()
                    } else {
                        format!("{}", bound)
                    };
                    line(
                        &mut out,
                        "rems_cycle_duration_seconds_bucket",
                        &[("broker", broker.as_str()), ("le", le.as_str())],
                        count as f64,
                    );
                }
                line(
                    &mut out,
                    "rems_cycle_duration_seconds_sum",
                    &[("broker", broker.as_str())],
                    histogram.get_sum(),
                );
                line(
                    &mut out,
                    "rems_cycle_duration_seconds_count",
                    &[("broker", broker.as_str())],
                    histogram.get_count() as f64,
                );
            }

            header(
                &mut out,
                "rems_metrics_collected",
                "gauge",
                "Metrics emitted by the last cycle",
            );
            for (broker, m) in brokers.iter() {
                line(
                    &mut out,
                    "rems_metrics_collected",
                    &[("broker", broker.as_str())],
                    m.metrics_collected.get(),
                );
            }
        }
        drop(brokers);

        let categories = self.categories.read().unwrap_or_else(|e| e.into_inner());
        if !categories.is_empty() {
            header(&mut out, "rems_category_failure_total", "counter", "Failed category queries");
            for ((broker, category), counter) in categories.iter() {
                line(
                    &mut out,
                    "rems_category_failure_total",
                    &[("broker", broker.as_str()), ("category", category.as_str())],
                    counter.get() as f64,
                );
            }
        }

        out
    }
}

fn header(out: &mut String, name: &str, kind: &str, help: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

fn line(out: &mut String, name: &str, labels: &[(&str, &str)], value: f64) {
    let labels: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect();
    let _ = writeln!(out, "{}{{{}}} {}", name, labels.join(","), value);
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CategoryOutcome;
    use std::time::Duration;

    #[test]
    fn test_counter_operations() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);
        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_histogram_operations() {
        let histogram = Histogram::new(&[0.1, 0.5, 1.0]);

        histogram.observe(0.05);
        histogram.observe(0.3);
        histogram.observe(0.8);
        histogram.observe(2.0);

        assert_eq!(histogram.get_count(), 4);

        let buckets = histogram.get_buckets();
        assert_eq!(buckets[0], (0.1, 1));
        assert_eq!(buckets[1], (0.5, 2));
        assert_eq!(buckets[2], (1.0, 3));
        assert_eq!(buckets[3].1, 4);
    }

    #[test]
    fn test_histogram_default_buckets() {
        let histogram = Histogram::with_default_buckets();
        assert_eq!(
            histogram.get_buckets().len(),
            DEFAULT_HISTOGRAM_BUCKETS.len() + 1
        );
    }

    #[test]
    fn test_record_cycle() {
        let metrics = InternalMetrics::new();
        let mut report = CycleReport {
            duration: Duration::from_millis(120),
            metric_count: 42,
            ..Default::default()
        };
        report
            .outcomes
            .insert(Category::Queue, CategoryOutcome::Collected(40));
        report
            .outcomes
            .insert(Category::Route, CategoryOutcome::Failed("boom".to_string()));

        metrics.record_cycle("EMS-1", &report);
        metrics.record_cycle_failure("EMS-1", 0.5);

        let broker = metrics.broker("EMS-1");
        assert_eq!(broker.cycle_success_total.get(), 1);
        assert_eq!(broker.cycle_failure_total.get(), 1);
        assert_eq!(broker.cycle_duration_seconds.get_count(), 2);
        assert_eq!(broker.metrics_collected.get(), 42.0);
        assert_eq!(metrics.category_failures("EMS-1", Category::Route), 1);
        assert_eq!(metrics.category_failures("EMS-1", Category::Queue), 0);
    }

    #[test]
    fn test_broker_get_or_create() {
        let metrics = InternalMetrics::new();
        let first = metrics.broker("EMS-1");
        let again = metrics.broker("EMS-1");
        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &metrics.broker("EMS-2")));
    }

    #[test]
    fn test_clones_share_state() {
        let metrics = InternalMetrics::new();
        let clone = metrics.clone();
        clone.record_cycle_failure("b", 0.1);
        assert_eq!(metrics.broker("b").cycle_failure_total.get(), 1);
    }

    #[test]
    fn test_format_prometheus() {
        let metrics = InternalMetrics::new();
        let mut report = CycleReport::default();
        report
            .outcomes
            .insert(Category::Topic, CategoryOutcome::Failed("x".to_string()));
        metrics.record_cycle("EMS-1", &report);

        let output = metrics.format_prometheus();
        assert!(output.contains("# TYPE rems_cycle_success_total counter"));
        assert!(output.contains("rems_cycle_success_total{broker=\"EMS-1\"} 1"));
        assert!(output.contains("rems_cycle_duration_seconds_bucket{broker=\"EMS-1\",le=\"+Inf\"} 1"));
        assert!(output.contains(
            "rems_category_failure_total{broker=\"EMS-1\",category=\"Topic\"} 1"
        ));
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(InternalMetrics::new().format_prometheus(), "");
    }

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label("a\"b"), "a\\\"b");
    }
}
