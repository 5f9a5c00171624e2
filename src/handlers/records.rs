//! Raw records endpoint handler.
//!
//! This module provides the `/records` endpoint, which runs one collection
//! cycle and returns the dotted records exactly as a push-style metrics
//! pipeline would receive them.

use axum::{extract::State, http::StatusCode, Json};
use bcache_exporter::naming::RecordView;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Handler for the /records endpoint.
#[instrument(skip(state))]
pub async fn records_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RecordView>>, StatusCode> {
    debug!("Processing /records request");
    state.scrape_stats.record_http_request();

    let (collection, _) = state.run_cycle().await.map_err(|e| {
        error!("Collection task failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(
        collection.records.iter().map(|record| record.view()).collect(),
    ))
}
