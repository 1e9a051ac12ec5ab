//! 메트릭 정의와 수집 결과 타입
//!
//! [`MetricDefinition`] and [`CategorySpec`] come from the metrics document in
//! the configuration; [`CollectedMetric`] is what a cycle emits.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::category::Category;

/// How the backend aggregates values within one reporting interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregationType {
    #[default]
    Average,
    Sum,
    Observation,
}

/// How the backend rolls values up over time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeRollupType {
    #[default]
    Average,
    Sum,
    Current,
}

/// How the backend rolls values up across a cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClusterRollupType {
    #[default]
    Individual,
    Collective,
}

impl AggregationType {
    fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Average => "AVERAGE",
            AggregationType::Sum => "SUM",
            AggregationType::Observation => "OBSERVATION",
        }
    }
}

impl TimeRollupType {
    fn as_str(&self) -> &'static str {
        match self {
            TimeRollupType::Average => "AVERAGE",
            TimeRollupType::Sum => "SUM",
            TimeRollupType::Current => "CURRENT",
        }
    }
}

impl ClusterRollupType {
    fn as_str(&self) -> &'static str {
        match self {
            ClusterRollupType::Individual => "INDIVIDUAL",
            ClusterRollupType::Collective => "COLLECTIVE",
        }
    }
}

/// One attribute to report for a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Attribute name looked up in the category's attribute table
    pub attr: String,

    /// Display name used instead of `attr` in the emitted name and path
    #[serde(default)]
    pub alias: Option<String>,

    #[serde(default)]
    pub aggregation_type: AggregationType,

    #[serde(default)]
    pub time_rollup_type: TimeRollupType,

    #[serde(default)]
    pub cluster_rollup_type: ClusterRollupType,
}

impl MetricDefinition {
    /// 속성 이름만으로 정의 생성
    pub fn new(attr: &str) -> Self {
        Self {
            attr: attr.to_string(),
            alias: None,
            aggregation_type: AggregationType::default(),
            time_rollup_type: TimeRollupType::default(),
            cluster_rollup_type: ClusterRollupType::default(),
        }
    }

    /// Alias 설정
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Name used in the emitted metric (alias wins over attr)
    pub fn display_name(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(&self.attr)
    }

    /// Properties forwarded to the backend with every metric
    pub fn properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        props.insert("attr".to_string(), self.attr.clone());
        if let Some(alias) = self.alias.as_ref().filter(|a| !a.is_empty()) {
            props.insert("alias".to_string(), alias.clone());
        }
        props.insert(
            "aggregationType".to_string(),
            self.aggregation_type.as_str().to_string(),
        );
        props.insert(
            "timeRollUpType".to_string(),
            self.time_rollup_type.as_str().to_string(),
        );
        props.insert(
            "clusterRollUpType".to_string(),
            self.cluster_rollup_type.as_str().to_string(),
        );
        props
    }
}

/// Per-category section of the metrics document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    #[serde(rename = "type")]
    pub category: Category,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Category prefix; the category default applies when unset
    #[serde(default)]
    pub metric_prefix: Option<String>,

    #[serde(default)]
    pub metrics: Vec<MetricDefinition>,
}

fn default_enabled() -> bool {
    true
}

impl CategorySpec {
    /// 활성화된 카테고리 스펙 생성
    pub fn new(category: Category, metrics: Vec<MetricDefinition>) -> Self {
        Self {
            category,
            enabled: true,
            metric_prefix: None,
            metrics,
        }
    }

    /// Category prefix 설정
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.metric_prefix = Some(prefix.to_string());
        self
    }

    /// 비활성화
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Configured prefix, or the category default when unset or blank
    pub fn resolved_prefix(&self) -> Option<String> {
        match self.metric_prefix.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Some(p.to_string()),
            _ => self.category.default_prefix().map(str::to_string),
        }
    }
}

/// One emitted metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedMetric {
    pub name: String,
    /// Decimal rendering of the value
    pub value: String,
    pub full_path: String,
    pub properties: BTreeMap<String, String>,
}

/// Output buffer shared by every collector of one cycle
///
/// Appends from concurrent collectors never lose entries. The buffer only
/// grows until the coordinator takes its contents.
#[derive(Debug, Clone, Default)]
pub struct MetricBuffer {
    inner: Arc<Mutex<Vec<CollectedMetric>>>,
}

impl MetricBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, metric: CollectedMetric) {
        self.lock().push(metric);
    }

    /// Append a whole batch under one lock
    pub fn extend(&self, metrics: Vec<CollectedMetric>) {
        if metrics.is_empty() {
            return;
        }
        self.lock().extend(metrics);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<CollectedMetric> {
        self.lock().clone()
    }

    /// Move the contents out, leaving the buffer empty
    pub fn take(&self) -> Vec<CollectedMetric> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CollectedMetric>> {
        // a collector that panicked mid-append cannot leave a torn Vec behind
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
