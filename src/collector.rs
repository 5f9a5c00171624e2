//! One bcache collection cycle.
//!
//! `BcacheCollector::collect` discovers cache sets, resolves their backing
//! devices, computes each statistic once per cache set and replicates it
//! under every backing device's name: 12 records per device. Nothing is
//! retained between calls, so a collector can be shared and invoked from any
//! scheduler.
//!
//! Failures are isolated per statistic. A malformed value drops that one
//! statistic for the cache set; a broken device link drops that one device.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::CollectError;
use crate::naming::{MetricCategory, MetricKey, MetricRecord};
use crate::stats::{
    get_bypassed, get_cache_ratio, get_cache_result, get_dirty_data, CacheStat, Window,
};
use crate::topology::{list_backing_devices, list_cache_instances, BackingDevice};

/// Default sysfs location of bcache cache sets.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/fs/bcache";

/// Collector settings fixed at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Directory holding one subdirectory per cache set UUID.
    pub sysfs_root: PathBuf,
    /// Log every emitted record at info level.
    pub verbose: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            verbose: false,
        }
    }
}

/// Result of one cycle: every record that could be computed, plus the
/// failures that were isolated along the way.
#[derive(Debug, Default)]
pub struct Collection {
    pub records: Vec<MetricRecord>,
    pub errors: Vec<CollectError>,
}

/// Stateless bcache statistics collector.
#[derive(Debug, Clone, Default)]
pub struct BcacheCollector {
    config: CollectorConfig,
}

impl BcacheCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Runs one cycle and returns the records.
    pub fn collect(&self) -> Vec<MetricRecord> {
        self.collect_with_errors().records
    }

    /// Runs one cycle and returns the records together with isolated failures.
    pub fn collect_with_errors(&self) -> Collection {
        let mut collection = Collection::default();

        for uuid in list_cache_instances(&self.config.sysfs_root) {
            self.collect_cache_set(&uuid, &mut collection);
        }

        debug!(
            "Collected {} bcache records ({} errors)",
            collection.records.len(),
            collection.errors.len()
        );
        collection
    }

    fn collect_cache_set(&self, uuid: &str, collection: &mut Collection) {
        let root = &self.config.sysfs_root;
        let verbose = self.config.verbose;

        let (devices, link_errors) = list_backing_devices(root, uuid);
        collection.errors.extend(link_errors);
        if devices.is_empty() {
            self.log_verbose(&format!("cache set {} has no backing devices", uuid));
            return;
        }

        // Dirty data is a cache-set total, reported unchanged under every
        // backing device of the set.
        let mut values: Vec<(MetricCategory, u64)> = Vec::with_capacity(12);
        self.push_value(
            &mut values,
            collection,
            MetricCategory::DirtyData,
            get_dirty_data(root, uuid, verbose),
        );

        for window in Window::ALL {
            self.push_value(
                &mut values,
                collection,
                MetricCategory::CacheRatio(window),
                get_cache_ratio(root, uuid, window, verbose).map(|ratio| ratio as u64),
            );
        }

        for stat in CacheStat::ALL {
            self.push_value(
                &mut values,
                collection,
                MetricCategory::CacheStats(stat),
                get_cache_result(root, uuid, stat, verbose),
            );
        }

        self.push_value(
            &mut values,
            collection,
            MetricCategory::Bypassed,
            get_bypassed(root, uuid, verbose),
        );

        for device in &devices {
            self.emit_device(device, &values, collection);
        }
    }

    fn push_value(
        &self,
        values: &mut Vec<(MetricCategory, u64)>,
        collection: &mut Collection,
        category: MetricCategory,
        result: Result<u64, CollectError>,
    ) {
        match result {
            Ok(value) => values.push((category, value)),
            Err(e) => {
                warn!("Skipping bcache statistic {:?}: {}", category, e);
                collection.errors.push(e);
            }
        }
    }

    fn emit_device(
        &self,
        device: &BackingDevice,
        values: &[(MetricCategory, u64)],
        collection: &mut Collection,
    ) {
        for &(category, value) in values {
            let record = MetricRecord::gauge(MetricKey::new(&device.name, category), value);
            self.log_verbose(&format!("New root: {} - Values: {}", record.name(), value));
            collection.records.push(record);
        }
    }

    fn log_verbose(&self, msg: &str) {
        if self.config.verbose {
            info!("bcache [verbose]: {}", msg);
        }
    }
}
