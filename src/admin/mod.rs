//! 브로커 admin 인터페이스 모듈
//!
//! The collector core only sees [`AdminConnection`]; how the statistics are
//! fetched (here: a JSON admin gateway over HTTP) stays behind the trait.
//!
//! # Example
//!
//! ```ignore
//! use rems_monitor::admin::{AdminConnection, HttpAdminClient};
//!
//! let client = HttpAdminClient::new("http://localhost:7222", 5000)?.with_auth("admin", "");
//! let queues = client.queues().await?;
//! ```

mod client;
mod model;

use async_trait::async_trait;

pub use client::{HttpAdminClient, TlsOptions};
pub use model::{
    AsDestination, ConnectionInfo, ConsumerInfo, DestinationInfo, DurableInfo, EndpointInfo,
    ProducerInfo, QueueInfo, RouteInfo, ServerInfo, ServerState, StatData, TopicInfo,
    DESTINATION_TYPE_QUEUE, DESTINATION_TYPE_TOPIC,
};

use crate::error::AdminError;

/// Admin 작업 결과 타입
pub type AdminResult<T> = Result<T, AdminError>;

/// Read-only handle onto one broker's admin interface
///
/// Implementations must tolerate concurrent calls from several collectors at
/// once. The collector never closes the handle; its owner does.
#[async_trait]
pub trait AdminConnection: Send + Sync {
    /// Server-wide statistics
    async fn server_info(&self) -> AdminResult<ServerInfo>;

    /// Statistics for every queue
    async fn queues(&self) -> AdminResult<Vec<QueueInfo>>;

    /// Statistics for every topic
    async fn topics(&self) -> AdminResult<Vec<TopicInfo>>;

    /// Statistics for every route
    async fn routes(&self) -> AdminResult<Vec<RouteInfo>>;

    /// Statistics for every durable subscription
    async fn durables(&self) -> AdminResult<Vec<DurableInfo>>;

    /// Statistics for every client connection
    async fn connections(&self) -> AdminResult<Vec<ConnectionInfo>>;

    /// Per-producer statistics
    async fn producers(&self) -> AdminResult<Vec<ProducerInfo>>;

    /// Per-consumer statistics
    async fn consumers(&self) -> AdminResult<Vec<ConsumerInfo>>;
}
