//! Metric keys and the records handed to the metrics pipeline.
//!
//! Every record is named `<device>.<category>[.<subcategory>]`:
//! - `sda.df_complex-dirty_data`
//! - `sda.cache_ratio.<window>`
//! - `sda.cache_stats.<stat>`
//! - `sda.bypassed`

use serde::Serialize;
use std::fmt;

use crate::stats::{CacheStat, Window};

/// Separator between name segments.
pub const METRIC_DELIM: &str = ".";

/// Plugin name records are dispatched under.
pub const PLUGIN_NAME: &str = "bcache";

/// What a record measures, below the device segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricCategory {
    DirtyData,
    CacheRatio(Window),
    CacheStats(CacheStat),
    Bypassed,
}

impl MetricCategory {
    /// Name segments following the device name.
    pub fn segments(&self) -> Vec<&'static str> {
        match self {
            MetricCategory::DirtyData => vec!["df_complex-dirty_data"],
            MetricCategory::CacheRatio(window) => vec!["cache_ratio", window.as_str()],
            MetricCategory::CacheStats(stat) => vec!["cache_stats", stat.as_str()],
            MetricCategory::Bypassed => vec!["bypassed"],
        }
    }
}

/// Builds the dotted metric name for a device and category.
pub fn metric_name(device: &str, category: MetricCategory) -> String {
    let mut segments = vec![device];
    segments.extend(category.segments());
    segments.join(METRIC_DELIM)
}

/// Device-scoped key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub device: String,
    pub category: MetricCategory,
}

impl MetricKey {
    pub fn new(device: impl Into<String>, category: MetricCategory) -> Self {
        Self {
            device: device.into(),
            category,
        }
    }

    pub fn name(&self) -> String {
        metric_name(&self.device, self.category)
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Type tag of a record. Every bcache value is a point-in-time gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
        }
    }
}

/// One emitted value. Values are truncated to integers, ratios included.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub key: MetricKey,
    pub value: u64,
    pub kind: MetricKind,
}

impl MetricRecord {
    pub fn gauge(key: MetricKey, value: u64) -> Self {
        Self {
            key,
            value,
            kind: MetricKind::Gauge,
        }
    }

    pub fn name(&self) -> String {
        self.key.name()
    }

    /// Serializable flat view: dotted name, value and type tag.
    pub fn view(&self) -> RecordView {
        RecordView {
            plugin: PLUGIN_NAME,
            name: self.name(),
            value: self.value,
            kind: self.kind,
        }
    }
}

/// Wire form of a [`MetricRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub plugin: &'static str,
    pub name: String,
    pub value: u64,
    #[serde(rename = "type")]
    pub kind: MetricKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert_eq!(
            metric_name("sda", MetricCategory::DirtyData),
            "sda.df_complex-dirty_data"
        );
        assert_eq!(
            metric_name("sda", MetricCategory::CacheRatio(Window::FiveMinute)),
            "sda.cache_ratio.five_minute"
        );
        assert_eq!(
            metric_name("nvme0n1", MetricCategory::CacheStats(CacheStat::BypassMisses)),
            "nvme0n1.cache_stats.bypass_misses"
        );
        assert_eq!(metric_name("sdb", MetricCategory::Bypassed), "sdb.bypassed");
    }

    #[test]
    fn test_metric_name_is_deterministic() {
        let category = MetricCategory::CacheRatio(Window::Day);
        assert_eq!(metric_name("sdc", category), metric_name("sdc", category));
        assert_eq!(MetricKey::new("sdc", category).to_string(), "sdc.cache_ratio.day");
    }

    #[test]
    fn test_record_view_json() {
        let record = MetricRecord::gauge(MetricKey::new("sda", MetricCategory::Bypassed), 42);
        let json = serde_json::to_value(record.view()).unwrap();

        assert_eq!(json["name"], "sda.bypassed");
        assert_eq!(json["value"], 42);
        assert_eq!(json["type"], "gauge");
        assert_eq!(json["plugin"], "bcache");
    }
}
