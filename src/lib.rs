//! bcache Exporter Library
//!
//! This library collects block-cache (bcache) performance statistics from
//! the kernel's sysfs interface and turns them into typed, named gauge
//! records. It is framework-agnostic: a collection cycle is a plain function
//! call, so any scheduler (HTTP scrape, timer loop, cron) can drive it.
//!
//! # Features
//!
//! - **Topology Discovery**: Cache sets by UUID and their backing devices
//! - **Unit Parsing**: Kernel pretty-printed sizes (`512k`, `1.5G`) to bytes
//! - **Failure Isolation**: Absent files read as zero, malformed values are reported
//! - **Stateless Cycles**: Nothing is retained between collections
//!
//! # Usage
//!
//! ```rust,no_run
//! use bcache_exporter::{BcacheCollector, CollectorConfig};
//!
//! let collector = BcacheCollector::new(CollectorConfig {
//!     verbose: true,
//!     ..CollectorConfig::default()
//! });
//!
//! for record in collector.collect() {
//!     println!("{} {} {}", record.name(), record.value, record.kind.as_str());
//! }
//! ```

pub mod collector;
pub mod error;
pub mod naming;
pub mod scrape_stats;
pub mod stats;
pub mod sysfs;
pub mod topology;
pub mod units;

// Re-export main types for convenience
pub use collector::{BcacheCollector, Collection, CollectorConfig, DEFAULT_SYSFS_ROOT};
pub use error::CollectError;
pub use naming::{metric_name, MetricCategory, MetricKey, MetricKind, MetricRecord};
pub use scrape_stats::ScrapeStats;
pub use stats::{CacheStat, Window};
pub use units::{parse_size_token, ParseError};
