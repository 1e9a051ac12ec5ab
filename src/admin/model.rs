//! 브로커 admin 통계 모델
//!
//! Point-in-time statistics records as reported by the broker's admin
//! interface. Field names follow the gateway's camelCase JSON.

use serde::{Deserialize, Serialize};

/// Destination type code the broker uses for topics.
pub const DESTINATION_TYPE_TOPIC: i32 = 2;

/// Destination type code the broker uses for queues.
pub const DESTINATION_TYPE_QUEUE: i32 = 1;

/// Broker server state
///
/// Only the states the collector reasons about get their own variant; any
/// other code is kept verbatim so the `State` metric still reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ServerState {
    /// Plain standby server
    Standby,
    /// Active server
    Active,
    /// Fault-tolerant standby server
    FtStandby,
    /// Any other state code
    Other(i32),
}

impl ServerState {
    /// Raw state code
    pub fn code(&self) -> i32 {
        match self {
            ServerState::Standby => 3,
            ServerState::Active => 4,
            ServerState::FtStandby => 5,
            ServerState::Other(code) => *code,
        }
    }
}

impl From<i32> for ServerState {
    fn from(code: i32) -> Self {
        match code {
            3 => ServerState::Standby,
            4 => ServerState::Active,
            5 => ServerState::FtStandby,
            other => ServerState::Other(other),
        }
    }
}

impl From<ServerState> for i32 {
    fn from(state: ServerState) -> Self {
        state.code()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        ServerState::Other(0)
    }
}

/// Server-wide statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerInfo {
    pub server_name: String,
    pub version: String,
    pub state: ServerState,
    pub disk_read_rate: i64,
    pub disk_write_rate: i64,
    pub msg_mem: i64,
    pub max_msg_memory: i64,
    pub msg_mem_pooled: i64,
    pub sync_db_size: i64,
    pub async_db_size: i64,
    pub queue_count: i64,
    pub topic_count: i64,
    pub durable_count: i64,
    pub inbound_bytes_rate: i64,
    pub inbound_message_rate: i64,
    pub outbound_bytes_rate: i64,
    pub outbound_message_rate: i64,
    pub connection_count: i64,
    pub max_connections: i64,
    pub producer_count: i64,
    pub consumer_count: i64,
    pub session_count: i64,
    pub start_time: i64,
    pub up_time: i64,
    pub pending_message_count: i64,
    pub pending_message_size: i64,
    pub inbound_message_count: i64,
    pub outbound_message_count: i64,
    pub log_file_size: i64,
    pub log_file_max_size: i64,
    pub server_heartbeat_client_interval: i64,
    pub server_timeout_client_connection: i64,
    pub server_heartbeat_server_interval: i64,
    pub server_timeout_server_connection: i64,
    pub client_heartbeat_server_interval: i64,
    pub client_timeout_server_connection: i64,
    pub fault_tolerant_activation: i64,
    pub fault_tolerant_heartbeat: i64,
    pub fault_tolerant_reconnect_timeout: i64,
    pub max_statistics_memory: i64,
    pub reserve_memory: i64,
    pub route_recover_count: i64,
    pub route_recover_interval: i64,
    pub statistics_cleanup_interval: i64,
}

/// Inbound or outbound traffic statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatData {
    pub byte_rate: i64,
    pub message_rate: i64,
    pub total_bytes: i64,
    pub total_messages: i64,
}

/// Statistics shared by queues and topics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DestinationInfo {
    pub name: String,
    pub consumer_count: i64,
    pub pending_message_count: i64,
    pub pending_message_size: i64,
    pub flow_control_max_bytes: i64,
    pub max_msgs: i64,
    pub max_bytes: i64,
    pub inbound_statistics: StatData,
    pub outbound_statistics: StatData,
}

/// Access to the destination part of a queue or topic record
pub trait AsDestination {
    fn destination(&self) -> &DestinationInfo;
}

/// Queue statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueInfo {
    #[serde(flatten)]
    pub destination: DestinationInfo,
    pub in_transit_message_count: i64,
    pub receiver_count: i64,
    pub max_redelivery: i64,
    pub delivered_message_count: i64,
}

impl AsDestination for QueueInfo {
    fn destination(&self) -> &DestinationInfo {
        &self.destination
    }
}

/// Topic statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicInfo {
    #[serde(flatten)]
    pub destination: DestinationInfo,
    pub subscriber_count: i64,
    pub active_durable_count: i64,
    pub durable_count: i64,
}

impl AsDestination for TopicInfo {
    fn destination(&self) -> &DestinationInfo {
        &self.destination
    }
}

/// Producer or consumer statistics
///
/// Both are reported per client endpoint attached to a destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointInfo {
    #[serde(rename = "id")]
    pub id: i64,
    #[serde(rename = "connectionID", alias = "connectionId")]
    pub connection_id: i64,
    #[serde(rename = "sessionID", alias = "sessionId")]
    pub session_id: i64,
    pub destination_name: String,
    pub destination_type: i32,
    pub statistics: Option<StatData>,
}

/// Producer statistics
pub type ProducerInfo = EndpointInfo;

/// Consumer statistics
pub type ConsumerInfo = EndpointInfo;

/// Route statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteInfo {
    pub name: String,
    pub connected: bool,
    pub backlog_count: i64,
    pub backlog_size: i64,
    pub inbound_statistics: Option<StatData>,
    pub outbound_statistics: Option<StatData>,
}

/// Durable subscription statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DurableInfo {
    pub durable_name: String,
    pub topic_name: String,
    pub pending_message_count: i64,
    pub pending_message_size: i64,
}

/// Client connection statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionInfo {
    #[serde(rename = "id")]
    pub id: i64,
    pub host: String,
    #[serde(rename = "type")]
    pub connection_type: String,
    pub session_count: i64,
    pub consumer_count: i64,
    pub producer_count: i64,
    pub start_time: i64,
    pub up_time: i64,
}
