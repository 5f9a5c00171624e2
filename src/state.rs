//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers. It holds no collected values: every scrape runs a
//! fresh collection cycle.

use bcache_exporter::{BcacheCollector, Collection, ScrapeStats};
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::Config;
use crate::metrics::BcacheMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub registry: Registry,
    pub metrics: BcacheMetrics,
    pub collector: BcacheCollector,
    pub config: Arc<Config>,
    pub scrape_stats: Arc<ScrapeStats>,
    /// Serializes scrapes so that reset-and-fill of the gauge families is not interleaved.
    pub scrape_lock: Mutex<()>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Runs one collection cycle off the async runtime and records its statistics.
    pub async fn run_cycle(&self) -> Result<(Collection, f64), tokio::task::JoinError> {
        let collector = self.collector.clone();
        let start = Instant::now();
        let collection = tokio::task::spawn_blocking(move || collector.collect_with_errors()).await?;
        let duration = start.elapsed().as_secs_f64();

        self.scrape_stats.record_cycle(&collection, duration);
        debug!(
            "Collection cycle finished in {:.3}s with {} records",
            duration,
            collection.records.len()
        );
        Ok((collection, duration))
    }
}
