//! Category 전략 테이블
//!
//! Everything that varies per category lives here: which admin call fetches
//! the snapshots, which name the filter sees and how the resource part of
//! the metric path is composed.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::metric::CategorySpec;
use super::path::{join, Segment};
use crate::admin::{
    AdminConnection, AdminResult, ConnectionInfo, ConsumerInfo, DurableInfo, EndpointInfo,
    ProducerInfo, QueueInfo, RouteInfo, ServerInfo, TopicInfo, DESTINATION_TYPE_TOPIC,
};

/// Resource category of the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Server,
    Queue,
    Topic,
    Producer,
    Consumer,
    Route,
    Durable,
    Connection,
}

impl Category {
    /// Every category, in collection order
    pub const ALL: [Category; 8] = [
        Category::Server,
        Category::Queue,
        Category::Topic,
        Category::Producer,
        Category::Consumer,
        Category::Route,
        Category::Durable,
        Category::Connection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Server => "Server",
            Category::Queue => "Queue",
            Category::Topic => "Topic",
            Category::Producer => "Producer",
            Category::Consumer => "Consumer",
            Category::Route => "Route",
            Category::Durable => "Durable",
            Category::Connection => "Connection",
        }
    }

    /// Path prefix used when the category spec sets none
    pub fn default_prefix(&self) -> Option<&'static str> {
        match self {
            Category::Server => None,
            Category::Queue => Some("Queues"),
            Category::Topic => Some("Topics"),
            Category::Producer => Some("Producers"),
            Category::Consumer => Some("Consumers"),
            Category::Route => Some("Routes"),
            Category::Durable => Some("Durables"),
            Category::Connection => Some("Connections"),
        }
    }

    /// Whether resources of this category pass through the name filter
    pub fn is_name_filtered(&self) -> bool {
        !matches!(self, Category::Server | Category::Connection)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statistics record of any category
#[derive(Debug, Clone)]
pub enum ResourceSnapshot {
    Server(ServerInfo),
    Queue(QueueInfo),
    Topic(TopicInfo),
    Producer(ProducerInfo),
    Consumer(ConsumerInfo),
    Route(RouteInfo),
    Durable(DurableInfo),
    Connection(ConnectionInfo),
}

impl ResourceSnapshot {
    pub fn category(&self) -> Category {
        match self {
            ResourceSnapshot::Server(_) => Category::Server,
            ResourceSnapshot::Queue(_) => Category::Queue,
            ResourceSnapshot::Topic(_) => Category::Topic,
            ResourceSnapshot::Producer(_) => Category::Producer,
            ResourceSnapshot::Consumer(_) => Category::Consumer,
            ResourceSnapshot::Route(_) => Category::Route,
            ResourceSnapshot::Durable(_) => Category::Durable,
            ResourceSnapshot::Connection(_) => Category::Connection,
        }
    }

    /// Name the inclusion filter is evaluated against
    ///
    /// Producers and consumers are filtered by their destination name,
    /// durables by the durable name. Empty names count as absent.
    pub fn filter_name(&self) -> Option<&str> {
        let name = match self {
            ResourceSnapshot::Server(s) => s.server_name.as_str(),
            ResourceSnapshot::Queue(q) => q.destination.name.as_str(),
            ResourceSnapshot::Topic(t) => t.destination.name.as_str(),
            ResourceSnapshot::Producer(e) | ResourceSnapshot::Consumer(e) => {
                e.destination_name.as_str()
            }
            ResourceSnapshot::Route(r) => r.name.as_str(),
            ResourceSnapshot::Durable(d) => d.durable_name.as_str(),
            ResourceSnapshot::Connection(c) => c.host.as_str(),
        };

        (!name.is_empty()).then_some(name)
    }
}

/// Query the broker for every snapshot of one category
pub async fn fetch(
    category: Category,
    connection: &dyn AdminConnection,
) -> AdminResult<Vec<ResourceSnapshot>> {
    let snapshots = match category {
        Category::Server => vec![ResourceSnapshot::Server(connection.server_info().await?)],
        Category::Queue => wrap(connection.queues().await?, ResourceSnapshot::Queue),
        Category::Topic => wrap(connection.topics().await?, ResourceSnapshot::Topic),
        Category::Producer => wrap(connection.producers().await?, ResourceSnapshot::Producer),
        Category::Consumer => wrap(connection.consumers().await?, ResourceSnapshot::Consumer),
        Category::Route => wrap(connection.routes().await?, ResourceSnapshot::Route),
        Category::Durable => wrap(connection.durables().await?, ResourceSnapshot::Durable),
        Category::Connection => {
            wrap(connection.connections().await?, ResourceSnapshot::Connection)
        }
    };

    Ok(snapshots)
}

fn wrap<T>(records: Vec<T>, f: fn(T) -> ResourceSnapshot) -> Vec<ResourceSnapshot> {
    records.into_iter().map(f).collect()
}

/// Prefixes of the queue and topic categories
///
/// Producers, consumers and durables place their metrics under the
/// destination they belong to, so they need these before any collector runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueTopicPrefixIndex {
    queue: String,
    topic: String,
}

impl Default for QueueTopicPrefixIndex {
    fn default() -> Self {
        Self {
            queue: "Queues".to_string(),
            topic: "Topics".to_string(),
        }
    }
}

impl QueueTopicPrefixIndex {
    /// Build from the enabled category specs; missing or blank prefixes use the defaults
    pub fn from_specs(specs: &[CategorySpec]) -> Self {
        let mut index = Self::default();

        for spec in specs.iter().filter(|s| s.enabled) {
            let prefix = match spec.metric_prefix.as_deref().map(str::trim) {
                Some(p) if !p.is_empty() => p.to_string(),
                _ => continue,
            };

            match spec.category {
                Category::Queue => index.queue = prefix,
                Category::Topic => index.topic = prefix,
                _ => {}
            }
        }

        index
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Prefix for a destination type code (topic code → topic, else queue)
    pub fn prefix_for(&self, destination_type: i32) -> &str {
        if destination_type == DESTINATION_TYPE_TOPIC {
            &self.topic
        } else {
            &self.queue
        }
    }
}

/// Cycle-wide inputs to path composition
#[derive(Debug, Clone, Default)]
pub struct PathContext {
    pub prefixes: Arc<QueueTopicPrefixIndex>,
    pub display_dynamic_ids: bool,
}

/// Category prefix and resource segment for one snapshot
///
/// `category_prefix` is the resolved prefix of the collecting category.
pub fn scope(
    snapshot: &ResourceSnapshot,
    category_prefix: Option<&str>,
    ctx: &PathContext,
) -> (Option<String>, Option<String>) {
    let own = category_prefix.map(str::to_string);

    match snapshot {
        ResourceSnapshot::Server(_) => (own, None),
        ResourceSnapshot::Queue(q) => (own, Some(q.destination.name.clone())),
        ResourceSnapshot::Topic(t) => (own, Some(t.destination.name.clone())),
        ResourceSnapshot::Route(r) => (own, Some(r.name.clone())),
        ResourceSnapshot::Durable(d) => (
            Some(ctx.prefixes.topic().to_string()),
            Some(join([
                Segment::Reported(&d.topic_name),
                Segment::Configured(category_prefix.unwrap_or("")),
                Segment::Reported(&d.durable_name),
            ])),
        ),
        ResourceSnapshot::Producer(e) | ResourceSnapshot::Consumer(e) => {
            endpoint_scope(e, category_prefix, ctx)
        }
        ResourceSnapshot::Connection(c) => {
            let id = c.id.to_string();
            (
                own,
                Some(join([
                    Segment::Reported(&id),
                    Segment::Reported(&c.host),
                    Segment::Reported(&c.connection_type),
                ])),
            )
        }
    }
}

fn endpoint_scope(
    endpoint: &EndpointInfo,
    category_prefix: Option<&str>,
    ctx: &PathContext,
) -> (Option<String>, Option<String>) {
    let destination_prefix = ctx.prefixes.prefix_for(endpoint.destination_type);
    let id = ctx.display_dynamic_ids.then(|| endpoint.id.to_string());

    let segment = join([
        Segment::Reported(&endpoint.destination_name),
        Segment::Configured(category_prefix.unwrap_or("")),
        Segment::Reported(id.as_deref().unwrap_or("")),
    ]);

    (Some(destination_prefix.to_string()), Some(segment))
}
