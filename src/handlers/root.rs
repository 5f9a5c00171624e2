//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that displays
//! a landing page with all available endpoints and descriptions.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.scrape_stats.record_http_request();

    let version = env!("CARGO_PKG_VERSION");

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;
    let uptime_str = format!("{}h {}m {}s", hours, minutes, seconds);

    let sysfs_root = state.collector.config().sysfs_root.display().to_string();

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>bcache Exporter</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; }}
        .container {{ max-width: 800px; margin: 0 auto; background: white; padding: 40px; border-radius: 8px; }}
        h1 {{ color: #333; border-bottom: 3px solid #007bff; padding-bottom: 15px; }}
        .endpoint-list li {{ margin: 12px 0; }}
        code {{ background: #e9ecef; padding: 2px 6px; border-radius: 3px; }}
    </style>
</head>
<body>
<div class="container">
    <h1>bcache Exporter</h1>
    <p>Version <code>{version}</code> - uptime {uptime} - reading <code>{sysfs_root}</code></p>

    <h2>Available Endpoints</h2>
    <ul class="endpoint-list">
        <li><a href="/metrics">/metrics</a> - Prometheus-compatible metrics endpoint</li>
        <li><a href="/records">/records</a> - Dotted gauge records of one collection cycle (JSON)</li>
        <li><a href="/health">/health</a> - Exporter internal health &amp; cycle statistics (text)</li>
        <li><a href="/config">/config</a> - Active runtime configuration (read-only)</li>
    </ul>
</div>
</body>
</html>"#,
        version = version,
        uptime = uptime_str,
        sysfs_root = sysfs_root
    );

    Html(html)
}
