//! HTTP request handlers
//!
//! Contains handlers for all HTTP endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;
use tracing::{debug, instrument};

use super::AppState;
use crate::collector::CollectedMetric;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Health status
    status: String,
    /// Application version
    version: String,
    /// Metrics currently held
    metrics: usize,
}

/// Root endpoint - displays basic info
pub async fn root(State(state): State<AppState>) -> Html<String> {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>rEMS-Monitor</title>
</head>
<body>
    <h1>rEMS-Monitor</h1>
    <p>Version: {}</p>
    <p>Brokers: {}</p>
    <ul>
        <li><a href="/health">Health Check</a></li>
        <li><a href="{}">Metrics</a></li>
        <li><a href="/metrics.json">Metrics (JSON)</a></li>
    </ul>
</body>
</html>"#,
        env!("CARGO_PKG_VERSION"),
        state.config.brokers.len(),
        state.config.server.path
    );
    Html(html)
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics: state.store.len(),
    })
}

/// Render metrics as `<full_path>=<value>` lines
pub fn format_metrics(metrics: &[CollectedMetric]) -> String {
    let mut output = String::with_capacity(metrics.len() * 64);
    for metric in metrics {
        output.push_str(&metric.full_path);
        output.push('=');
        output.push_str(&metric.value);
        output.push('\n');
    }
    output
}

/// Metrics endpoint - latest collected metrics followed by self-metrics
#[instrument(skip(state), name = "metrics_handler")]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let collected = state.store.all();

    let mut output = format_metrics(&collected);
    output.push_str(&state.internal.format_prometheus());
    output.push_str(&format!(
        r#"# HELP rems_monitor_info rEMS-Monitor information
# TYPE rems_monitor_info gauge
rems_monitor_info{{version="{}"}} 1
"#,
        env!("CARGO_PKG_VERSION")
    ));

    debug!(metrics_count = collected.len(), "Serving metrics");

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        output,
    )
}

/// Metrics as JSON array
pub async fn metrics_json(State(state): State<AppState>) -> Json<Vec<CollectedMetric>> {
    Json(state.store.all())
}
