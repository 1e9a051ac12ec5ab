//! Attribute name → value 매핑
//!
//! One static lookup table per category maps a case-insensitive attribute
//! name to an extraction function over that category's snapshot. A name
//! missing from the table, or whose source data the broker did not report,
//! resolves to `None`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;

use super::category::{Category, ResourceSnapshot};
use crate::admin::{
    AsDestination, ConnectionInfo, DurableInfo, EndpointInfo, QueueInfo, RouteInfo, ServerInfo,
    ServerState, TopicInfo,
};

enum Extractor<T> {
    Value(fn(&T) -> i64),
    Optional(fn(&T) -> Option<i64>),
}

struct Entry<T> {
    name: &'static str,
    extract: Extractor<T>,
}

/// Lookup table for one snapshot type
pub struct AttributeTable<T> {
    entries: HashMap<String, Entry<T>>,
}

impl<T> AttributeTable<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn field(mut self, name: &'static str, f: fn(&T) -> i64) -> Self {
        self.entries.insert(
            name.to_ascii_lowercase(),
            Entry {
                name,
                extract: Extractor::Value(f),
            },
        );
        self
    }

    fn optional(mut self, name: &'static str, f: fn(&T) -> Option<i64>) -> Self {
        self.entries.insert(
            name.to_ascii_lowercase(),
            Entry {
                name,
                extract: Extractor::Optional(f),
            },
        );
        self
    }

    /// Resolve `attr` (any case) against one record
    pub fn resolve(&self, record: &T, attr: &str) -> Option<i64> {
        let entry = self.entries.get(&attr.to_ascii_lowercase())?;
        match entry.extract {
            Extractor::Value(f) => Some(f(record)),
            Extractor::Optional(f) => f(record),
        }
    }

    /// Canonical attribute names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.values().map(|e| e.name).collect();
        names.sort_unstable();
        names
    }
}

fn flag(b: bool) -> i64 {
    i64::from(b)
}

fn destination_fields<T: AsDestination>(table: AttributeTable<T>) -> AttributeTable<T> {
    table
        .field("ConsumerCount", |t| t.destination().consumer_count)
        .field("PendingMessageCount", |t| t.destination().pending_message_count)
        .field("PendingMessageSize", |t| t.destination().pending_message_size)
        .field("FlowControlMaxBytes", |t| t.destination().flow_control_max_bytes)
        .field("MaxMsgs", |t| t.destination().max_msgs)
        .field("MaxBytes", |t| t.destination().max_bytes)
        .field("InboundByteRate", |t| t.destination().inbound_statistics.byte_rate)
        .field("InboundMessageRate", |t| {
            t.destination().inbound_statistics.message_rate
        })
        .field("InboundByteCount", |t| t.destination().inbound_statistics.total_bytes)
        .field("InboundMessageCount", |t| {
            t.destination().inbound_statistics.total_messages
        })
        .field("OutboundByteRate", |t| t.destination().outbound_statistics.byte_rate)
        .field("OutboundMessageRate", |t| {
            t.destination().outbound_statistics.message_rate
        })
        .field("OutboundByteCount", |t| {
            t.destination().outbound_statistics.total_bytes
        })
        .field("OutboundMessageCount", |t| {
            t.destination().outbound_statistics.total_messages
        })
}

static SERVER: Lazy<AttributeTable<ServerInfo>> = Lazy::new(|| {
    AttributeTable::<ServerInfo>::new()
        .field("DiskReadRate", |s| s.disk_read_rate)
        .field("DiskWriteRate", |s| s.disk_write_rate)
        .field("State", |s| i64::from(s.state.code()))
        .field("MsgMemory", |s| s.msg_mem)
        .field("MaxMsgMemory", |s| s.max_msg_memory)
        .field("MemoryPooled", |s| s.msg_mem_pooled)
        .field("SyncDBSize", |s| s.sync_db_size)
        .field("AsyncDBSize", |s| s.async_db_size)
        .field("QueueCount", |s| s.queue_count)
        .field("TopicCount", |s| s.topic_count)
        .field("DurableCount", |s| s.durable_count)
        .field("InboundBytesRate", |s| s.inbound_bytes_rate)
        .field("InboundMessageRate", |s| s.inbound_message_rate)
        .field("OutboundBytesRate", |s| s.outbound_bytes_rate)
        .field("OutboundMessageRate", |s| s.outbound_message_rate)
        .field("ConnectionCount", |s| s.connection_count)
        .field("MaxConnections", |s| s.max_connections)
        .field("ProducerCount", |s| s.producer_count)
        .field("ConsumerCount", |s| s.consumer_count)
        .field("SessionCount", |s| s.session_count)
        .field("StartTime", |s| s.start_time)
        .field("UpTime", |s| s.up_time)
        .field("PendingMessageCount", |s| s.pending_message_count)
        .field("PendingMessageSize", |s| s.pending_message_size)
        .field("InboundMessageCount", |s| s.inbound_message_count)
        .field("OutboundMessageCount", |s| s.outbound_message_count)
        .field("LogFileSize", |s| s.log_file_size)
        .field("LogFileMaxSize", |s| s.log_file_max_size)
        .field("ServerHeartbeatClientInterval", |s| {
            s.server_heartbeat_client_interval
        })
        .field("ServerTimeoutClientConnection", |s| {
            s.server_timeout_client_connection
        })
        .field("ServerHeartbeatServerInterval", |s| {
            s.server_heartbeat_server_interval
        })
        .field("ServerTimeoutServerConnection", |s| {
            s.server_timeout_server_connection
        })
        .field("ClientHeartbeatServerInterval", |s| {
            s.client_heartbeat_server_interval
        })
        .field("ClientTimeoutServerConnection", |s| {
            s.client_timeout_server_connection
        })
        .field("FaultTolerantActivation", |s| s.fault_tolerant_activation)
        .field("FaultTolerantHeartbeat", |s| s.fault_tolerant_heartbeat)
        .field("FaultTolerantReconnectTimeout", |s| {
            s.fault_tolerant_reconnect_timeout
        })
        .field("MaxStatisticsMemory", |s| s.max_statistics_memory)
        .field("ReserveMemory", |s| s.reserve_memory)
        .field("RouteRecoverCount", |s| s.route_recover_count)
        .field("RouteRecoverInterval", |s| s.route_recover_interval)
        .field("StatisticsCleanupInterval", |s| s.statistics_cleanup_interval)
        .field("IsActiveServer", |s| flag(s.state == ServerState::Active))
        .field("IsFaultTolerantStandbyServer", |s| {
            flag(s.state == ServerState::FtStandby)
        })
});

static QUEUE: Lazy<AttributeTable<QueueInfo>> = Lazy::new(|| {
    destination_fields(AttributeTable::<QueueInfo>::new())
        .field("InTransitCount", |q| q.in_transit_message_count)
        .field("ReceiverCount", |q| q.receiver_count)
        .field("MaxRedelivery", |q| q.max_redelivery)
        .field("DeliveredMessageCount", |q| q.delivered_message_count)
});

static TOPIC: Lazy<AttributeTable<TopicInfo>> = Lazy::new(|| {
    destination_fields(AttributeTable::<TopicInfo>::new())
        .field("SubscriberCount", |t| t.subscriber_count)
        .field("ActiveDurableCount", |t| t.active_durable_count)
        .field("DurableCount", |t| t.durable_count)
});

// producers and consumers share one record shape
static ENDPOINT: Lazy<AttributeTable<EndpointInfo>> = Lazy::new(|| {
    AttributeTable::<EndpointInfo>::new()
        .optional("TotalMessages", |e| e.statistics.map(|s| s.total_messages))
        .optional("TotalBytes", |e| e.statistics.map(|s| s.total_bytes))
        .optional("MessageRate", |e| e.statistics.map(|s| s.message_rate))
        .field("ConnectionID", |e| e.connection_id)
        .field("SessionID", |e| e.session_id)
});

static ROUTE: Lazy<AttributeTable<RouteInfo>> = Lazy::new(|| {
    AttributeTable::<RouteInfo>::new()
        .optional("InboundMessageRate", |r| {
            r.inbound_statistics.map(|s| s.message_rate)
        })
        .optional("InboundTotalMessages", |r| {
            r.inbound_statistics.map(|s| s.total_messages)
        })
        .optional("InboundByteRate", |r| r.inbound_statistics.map(|s| s.byte_rate))
        .optional("OutboundMessageRate", |r| {
            r.outbound_statistics.map(|s| s.message_rate)
        })
        .optional("OutboundTotalMessages", |r| {
            r.outbound_statistics.map(|s| s.total_messages)
        })
        .optional("OutboundByteRate", |r| {
            r.outbound_statistics.map(|s| s.byte_rate)
        })
        .field("BacklogCount", |r| r.backlog_count)
        .field("BacklogSize", |r| r.backlog_size)
        .field("IsConnected", |r| flag(r.connected))
});

static DURABLE: Lazy<AttributeTable<DurableInfo>> = Lazy::new(|| {
    AttributeTable::<DurableInfo>::new()
        .field("PendingMessageCount", |d| d.pending_message_count)
        .field("PendingMessageSize", |d| d.pending_message_size)
});

static CONNECTION: Lazy<AttributeTable<ConnectionInfo>> = Lazy::new(|| {
    AttributeTable::<ConnectionInfo>::new()
        .field("SessionCount", |c| c.session_count)
        .field("ConsumerCount", |c| c.consumer_count)
        .field("ProducerCount", |c| c.producer_count)
        .field("StartTime", |c| c.start_time)
        .field("UpTime", |c| c.up_time)
});

/// Value of `attr` for one snapshot, or `None` when unknown or unreported
pub fn resolve_value(snapshot: &ResourceSnapshot, attr: &str) -> Option<Decimal> {
    let raw = match snapshot {
        ResourceSnapshot::Server(s) => SERVER.resolve(s, attr),
        ResourceSnapshot::Queue(q) => QUEUE.resolve(q, attr),
        ResourceSnapshot::Topic(t) => TOPIC.resolve(t, attr),
        ResourceSnapshot::Producer(e) | ResourceSnapshot::Consumer(e) => ENDPOINT.resolve(e, attr),
        ResourceSnapshot::Route(r) => ROUTE.resolve(r, attr),
        ResourceSnapshot::Durable(d) => DURABLE.resolve(d, attr),
        ResourceSnapshot::Connection(c) => CONNECTION.resolve(c, attr),
    }?;

    Some(Decimal::from(raw))
}

/// Attribute names a category understands
pub fn known_attributes(category: Category) -> Vec<&'static str> {
    match category {
        Category::Server => SERVER.names(),
        Category::Queue => QUEUE.names(),
        Category::Topic => TOPIC.names(),
        Category::Producer | Category::Consumer => ENDPOINT.names(),
        Category::Route => ROUTE.names(),
        Category::Durable => DURABLE.names(),
        Category::Connection => CONNECTION.names(),
    }
}
