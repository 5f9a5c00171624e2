//! Metrics endpoint handler for Prometheus scraping.
//!
//! This module provides the `/metrics` endpoint handler. Each scrape runs one
//! collection cycle, refreshes the gauge families and encodes the registry in
//! Prometheus text format.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 64 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    CollectionFailed,
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        let message = match self {
            MetricsError::CollectionFailed => "Failed to collect bcache statistics",
            MetricsError::EncodingFailed => "Failed to encode metrics",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    debug!("Processing /metrics request");
    state.scrape_stats.record_http_request();

    let _guard = state.scrape_lock.lock().await;

    let (collection, duration) = state.run_cycle().await.map_err(|e| {
        error!("Collection task failed: {}", e);
        MetricsError::CollectionFailed
    })?;
    state.metrics.update(&collection, duration);

    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    TextEncoder::new()
        .encode(&state.registry.gather(), &mut buffer)
        .map_err(|e| {
            error!("Failed to encode metrics: {}", e);
            MetricsError::EncodingFailed
        })?;

    String::from_utf8(buffer).map_err(|e| {
        error!("Metrics output is not UTF-8: {}", e);
        MetricsError::EncodingFailed
    })
}
