//! HTTP sink module
//!
//! Keeps the latest cycle's metrics per broker and serves them over an
//! Axum-based HTTP server.

pub mod handlers;

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use axum::{routing::get, Router};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::collector::CollectedMetric;
use crate::config::Config;
use crate::metrics::InternalMetrics;

/// Latest metrics of every broker
#[derive(Debug, Clone, Default)]
pub struct MetricStore {
    inner: Arc<RwLock<BTreeMap<String, Vec<CollectedMetric>>>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a broker's metrics with the result of its latest cycle
    pub fn replace(&self, broker: &str, metrics: Vec<CollectedMetric>) {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(broker.to_string(), metrics);
    }

    /// Drop a broker's metrics after a failed cycle
    pub fn clear(&self, broker: &str) {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(broker);
    }

    /// Every stored metric, grouped by broker name
    pub fn all(&self) -> Vec<CollectedMetric> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .flat_map(|metrics| metrics.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Latest collected metrics
    pub store: MetricStore,
    /// Self-observability counters
    pub internal: InternalMetrics,
}

/// Build the router with the configured metrics path
pub fn router(state: AppState) -> Router {
    let metrics_path = state.config.server.path.clone();

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics.json", get(handlers::metrics_json))
        .route(&metrics_path, get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until a shutdown signal arrives
///
/// # Errors
/// Returns an error if the bind address is invalid or the server fails to start
pub async fn run(state: AppState) -> Result<()> {
    let bind_address = state.config.server.bind_address.clone();
    let port = state.config.server.port;
    let metrics_path = state.config.server.path.clone();

    let app = router(state);

    // Handle "localhost" specially, otherwise parse as IP address
    let bind_addr: std::net::IpAddr = if bind_address == "localhost" {
        std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)
    } else {
        bind_address
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind_address '{}': {}. Use an IP address (e.g., '0.0.0.0', '127.0.0.1') or 'localhost'.", bind_address, e))?
    };
    let addr = SocketAddr::from((bind_addr, port));
    info!(address = %addr, metrics_path = %metrics_path, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(path: &str) -> CollectedMetric {
        CollectedMetric {
            name: "X".to_string(),
            value: "1".to_string(),
            full_path: path.to_string(),
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn test_store_replace_and_clear() {
        let store = MetricStore::new();
        store.replace("b", vec![metric("b|X")]);
        store.replace("a", vec![metric("a|X"), metric("a|Y")]);
        assert_eq!(store.len(), 3);

        let paths: Vec<String> = store.all().into_iter().map(|m| m.full_path).collect();
        assert_eq!(paths, vec!["a|X", "a|Y", "b|X"]);

        store.replace("a", vec![]);
        assert_eq!(store.len(), 1);

        store.clear("b");
        assert!(store.is_empty());
    }
}
