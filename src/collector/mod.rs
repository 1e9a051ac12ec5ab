//! 브로커 메트릭 수집 모듈
//!
//! Fan-out collection engine: per broker and cycle one collector task runs
//! per enabled category, all appending into a shared buffer that the
//! coordinator harvests after a join barrier.
//!
//! # Example
//!
//! ```ignore
//! use rems_monitor::collector::{CollectionCoordinator, CollectorSettings};
//!
//! let coordinator = CollectionCoordinator::new(CollectorSettings::default());
//! let metrics = coordinator
//!     .collect(connection, &specs, &filters, "Custom Metrics|Tibco EMS", Some("EMS-1"))
//!     .await?;
//! ```

mod barrier;
mod category;
mod coordinator;
mod filter;
mod mapper;
mod metric;
mod path;
mod worker;

pub use barrier::{BarrierGuard, JoinBarrier};
pub use category::{fetch, scope, Category, PathContext, QueueTopicPrefixIndex, ResourceSnapshot};
pub use coordinator::{
    CollectionCoordinator, CollectorSettings, CycleReport, DEFAULT_CATEGORY_TIMEOUT,
};
pub use filter::{
    compile_patterns, should_include, should_include_legacy, FilterConfig, FilterMode, Pattern,
    SYSTEM_PREFIX, TMP_PREFIX,
};
pub use mapper::{known_attributes, resolve_value, AttributeTable};
pub use metric::{
    AggregationType, CategorySpec, ClusterRollupType, CollectedMetric, MetricBuffer,
    MetricDefinition, TimeRollupType,
};
pub use path::{build_path, join, join_segments, metric_prefix, Segment, SEPARATOR};
pub use worker::{CategoryCollector, CategoryOutcome, OutcomeLog};
