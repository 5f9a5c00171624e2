//! Prometheus metrics definitions for bcache-exporter.
//!
//! Each dotted record (`<device>.<category>[.<subcategory>]`) maps onto one
//! gauge family: the device becomes the `device` label and the subcategory
//! becomes a `window` or `stat` label.

use bcache_exporter::{Collection, MetricCategory};
use prometheus::{Gauge, GaugeVec, Opts, Registry};

/// Collection of Prometheus metrics for bcache statistics.
#[derive(Clone)]
pub struct BcacheMetrics {
    // ========== bcache Metrics ==========
    pub dirty_data_bytes: GaugeVec,  // labels: device
    pub cache_ratio: GaugeVec,       // labels: device, window
    pub cache_stats: GaugeVec,       // labels: device, stat
    pub bypassed_bytes: GaugeVec,    // labels: device

    // ========== Exporter Metrics ==========
    pub scrape_duration_seconds: Gauge,
    pub records: Gauge,
    pub collect_errors: Gauge,
}

impl BcacheMetrics {
    /// Creates and registers all Prometheus metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let dirty_data_bytes = GaugeVec::new(
            Opts::new(
                "bcache_dirty_data_bytes",
                "Dirty data of the cache set, reported under each backing device",
            ),
            &["device"],
        )?;
        let cache_ratio = GaugeVec::new(
            Opts::new(
                "bcache_cache_ratio",
                "Cache hit ratio in percent (truncated) per time window",
            ),
            &["device", "window"],
        )?;
        let cache_stats = GaugeVec::new(
            Opts::new(
                "bcache_cache_stats",
                "Five-minute cache event counters",
            ),
            &["device", "stat"],
        )?;
        let bypassed_bytes = GaugeVec::new(
            Opts::new(
                "bcache_bypassed_bytes",
                "Bytes that bypassed the cache in the last five minutes",
            ),
            &["device"],
        )?;

        let scrape_duration_seconds = Gauge::new(
            "bcache_exporter_scrape_duration_seconds",
            "Time spent running the last collection cycle",
        )?;
        let records = Gauge::new(
            "bcache_exporter_records",
            "Number of records produced by the last collection cycle",
        )?;
        let collect_errors = Gauge::new(
            "bcache_exporter_collect_errors",
            "Statistics or devices skipped in the last collection cycle",
        )?;

        registry.register(Box::new(dirty_data_bytes.clone()))?;
        registry.register(Box::new(cache_ratio.clone()))?;
        registry.register(Box::new(cache_stats.clone()))?;
        registry.register(Box::new(bypassed_bytes.clone()))?;
        registry.register(Box::new(scrape_duration_seconds.clone()))?;
        registry.register(Box::new(records.clone()))?;
        registry.register(Box::new(collect_errors.clone()))?;

        Ok(Self {
            dirty_data_bytes,
            cache_ratio,
            cache_stats,
            bypassed_bytes,
            scrape_duration_seconds,
            records,
            collect_errors,
        })
    }

    /// Replaces all bcache series with the contents of one collection.
    ///
    /// Series of devices that disappeared since the previous scrape are dropped.
    pub fn update(&self, collection: &Collection, duration_seconds: f64) {
        self.dirty_data_bytes.reset();
        self.cache_ratio.reset();
        self.cache_stats.reset();
        self.bypassed_bytes.reset();

        for record in &collection.records {
            let device = record.key.device.as_str();
            let value = record.value as f64;
            match record.key.category {
                MetricCategory::DirtyData => {
                    self.dirty_data_bytes.with_label_values(&[device]).set(value)
                }
                MetricCategory::CacheRatio(window) => self
                    .cache_ratio
                    .with_label_values(&[device, window.as_str()])
                    .set(value),
                MetricCategory::CacheStats(stat) => self
                    .cache_stats
                    .with_label_values(&[device, stat.as_str()])
                    .set(value),
                MetricCategory::Bypassed => {
                    self.bypassed_bytes.with_label_values(&[device]).set(value)
                }
            }
        }

        self.scrape_duration_seconds.set(duration_seconds);
        self.records.set(collection.records.len() as f64);
        self.collect_errors.set(collection.errors.len() as f64);
    }
}
