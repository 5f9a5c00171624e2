//! Integration tests for the collection cycle.
//!
//! These tests build fabricated bcache sysfs trees in a temporary directory
//! and verify the records `BcacheCollector::collect` produces from them.

use bcache_exporter::{
    BcacheCollector, CacheStat, CollectError, CollectorConfig, MetricCategory, MetricRecord,
    Window,
};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;
use tempfile::TempDir;

/// Helper to write a sysfs attribute, creating parent directories.
fn write_attr(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("{}\n", content)).unwrap();
}

/// Helper to attach a backing device entry whose `dev` link resolves to `device`.
fn attach_device(root: &Path, uuid: &str, bdev: &str, device: &str) {
    let node = root.join("block").join(device);
    fs::create_dir_all(&node).unwrap();
    let bdev_dir = root.join("bcache").join(uuid).join(bdev);
    fs::create_dir_all(&bdev_dir).unwrap();
    symlink(&node, bdev_dir.join("dev")).unwrap();
}

/// Helper to populate every statistic of one backing device.
fn populate_stats(root: &Path, uuid: &str, bdev: &str, dirty: &str, hits: u64, misses: u64) {
    let base = format!("bcache/{}/{}", uuid, bdev);
    write_attr(root, &format!("{}/dirty_data", base), dirty);
    for window in Window::ALL {
        let dir = format!("{}/{}", base, window.dir_name());
        write_attr(root, &format!("{}/cache_hits", dir), &hits.to_string());
        write_attr(root, &format!("{}/cache_misses", dir), &misses.to_string());
    }
    let five = format!("{}/stats_five_minute", base);
    write_attr(root, &format!("{}/cache_bypass_hits", five), "4");
    write_attr(root, &format!("{}/cache_bypass_misses", five), "5");
    write_attr(root, &format!("{}/cache_miss_collisions", five), "6");
    write_attr(root, &format!("{}/cache_readaheads", five), "7");
    write_attr(root, &format!("{}/bypassed", five), "2k");
}

fn collector(root: &Path) -> BcacheCollector {
    BcacheCollector::new(CollectorConfig {
        sysfs_root: root.join("bcache"),
        verbose: false,
    })
}

fn value_of(records: &[MetricRecord], name: &str) -> Option<u64> {
    records.iter().find(|r| r.name() == name).map(|r| r.value)
}

#[test]
fn test_empty_root_yields_no_records() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("bcache")).unwrap();
    write_attr(dir.path(), "bcache/register", "");

    assert!(collector(dir.path()).collect().is_empty());
}

#[test]
fn test_missing_root_yields_no_records() {
    let dir = TempDir::new().unwrap();
    assert!(collector(dir.path()).collect().is_empty());
}

#[test]
fn test_single_device_emits_twelve_records_in_order() {
    let dir = TempDir::new().unwrap();
    attach_device(dir.path(), "uuid-a", "bdev0", "sda");
    populate_stats(dir.path(), "uuid-a", "bdev0", "1.5M", 3, 1);

    let records = collector(dir.path()).collect();
    let names: Vec<String> = records.iter().map(MetricRecord::name).collect();

    assert_eq!(
        names,
        vec![
            "sda.df_complex-dirty_data",
            "sda.cache_ratio.five_minute",
            "sda.cache_ratio.hour",
            "sda.cache_ratio.day",
            "sda.cache_ratio.total",
            "sda.cache_stats.bypass_hits",
            "sda.cache_stats.bypass_misses",
            "sda.cache_stats.hits",
            "sda.cache_stats.miss_collisions",
            "sda.cache_stats.misses",
            "sda.cache_stats.readaheads",
            "sda.bypassed",
        ]
    );
    assert!(records.iter().all(|r| r.kind.as_str() == "gauge"));

    assert_eq!(value_of(&records, "sda.df_complex-dirty_data"), Some(1_572_864));
    assert_eq!(value_of(&records, "sda.cache_ratio.hour"), Some(75));
    assert_eq!(value_of(&records, "sda.cache_stats.hits"), Some(3));
    assert_eq!(value_of(&records, "sda.cache_stats.misses"), Some(1));
    assert_eq!(value_of(&records, "sda.cache_stats.readaheads"), Some(7));
    assert_eq!(value_of(&records, "sda.bypassed"), Some(2048));
}

#[test]
fn test_ratio_is_truncated() {
    let dir = TempDir::new().unwrap();
    attach_device(dir.path(), "uuid-a", "bdev0", "sda");
    // 2 / 3 = 66.67%
    populate_stats(dir.path(), "uuid-a", "bdev0", "0", 2, 1);

    let records = collector(dir.path()).collect();
    assert_eq!(value_of(&records, "sda.cache_ratio.total"), Some(66));
}

#[test]
fn test_multiple_devices_share_cache_level_values() {
    let dir = TempDir::new().unwrap();
    attach_device(dir.path(), "uuid-a", "bdev0", "sda");
    attach_device(dir.path(), "uuid-a", "bdev1", "sdb");
    populate_stats(dir.path(), "uuid-a", "bdev0", "1k", 1, 1);
    populate_stats(dir.path(), "uuid-a", "bdev1", "2k", 9, 1);
    write_attr(dir.path(), "bcache/uuid-a/bdev1/stats_five_minute/cache_hits", "42");

    let records = collector(dir.path()).collect();
    assert_eq!(records.len(), 24);

    for device in ["sda", "sdb"] {
        // Dirty data is summed over the cache set and replicated
        assert_eq!(
            value_of(&records, &format!("{}.df_complex-dirty_data", device)),
            Some(3072)
        );
        // Ratio comes from the first backing device (1 / 2)
        assert_eq!(
            value_of(&records, &format!("{}.cache_ratio.day", device)),
            Some(50)
        );
        // Counters come from the last backing device visited
        assert_eq!(
            value_of(&records, &format!("{}.cache_stats.hits", device)),
            Some(42)
        );
    }
}

#[test]
fn test_cache_set_without_backing_devices_is_silent() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("bcache/uuid-empty/cache0")).unwrap();
    attach_device(dir.path(), "uuid-b", "bdev0", "sdc");
    populate_stats(dir.path(), "uuid-b", "bdev0", "0", 0, 0);

    let records = collector(dir.path()).collect();
    assert_eq!(records.len(), 12);
    assert!(records.iter().all(|r| r.key.device == "sdc"));
    // No traffic at all is reported as a perfect ratio
    assert_eq!(value_of(&records, "sdc.cache_ratio.five_minute"), Some(100));
}

#[test]
fn test_absent_windows_read_as_idle() {
    let dir = TempDir::new().unwrap();
    attach_device(dir.path(), "uuid-a", "bdev0", "sda");

    let records = collector(dir.path()).collect();
    assert_eq!(records.len(), 12);
    assert_eq!(value_of(&records, "sda.df_complex-dirty_data"), Some(0));
    assert_eq!(value_of(&records, "sda.cache_ratio.hour"), Some(100));
    assert_eq!(value_of(&records, "sda.bypassed"), Some(0));
}

#[test]
fn test_broken_link_does_not_stop_other_devices() {
    let dir = TempDir::new().unwrap();
    attach_device(dir.path(), "uuid-a", "bdev0", "sda");
    populate_stats(dir.path(), "uuid-a", "bdev0", "1k", 1, 0);

    let broken = dir.path().join("bcache/uuid-a/bdev1");
    fs::create_dir_all(&broken).unwrap();
    symlink(dir.path().join("block/vanished"), broken.join("dev")).unwrap();

    attach_device(dir.path(), "uuid-b", "bdev0", "sdb");
    populate_stats(dir.path(), "uuid-b", "bdev0", "2k", 1, 0);

    let collection = collector(dir.path()).collect_with_errors();
    assert_eq!(collection.records.len(), 24);
    assert_eq!(value_of(&collection.records, "sda.cache_ratio.total"), Some(100));
    assert_eq!(
        value_of(&collection.records, "sdb.df_complex-dirty_data"),
        Some(2048)
    );

    assert_eq!(collection.errors.len(), 1);
    assert!(matches!(
        collection.errors[0],
        CollectError::DeviceLink { .. }
    ));
}

#[test]
fn test_malformed_statistic_is_skipped_alone() {
    let dir = TempDir::new().unwrap();
    attach_device(dir.path(), "uuid-a", "bdev0", "sda");
    populate_stats(dir.path(), "uuid-a", "bdev0", "1k", 1, 1);
    write_attr(
        dir.path(),
        "bcache/uuid-a/bdev0/stats_five_minute/cache_misses",
        "garbage",
    );

    let collection = collector(dir.path()).collect_with_errors();

    // cache_misses feeds both the five-minute ratio and the misses counter
    assert_eq!(collection.records.len(), 10);
    assert!(collection.records.iter().all(|r| !matches!(
        r.key.category,
        MetricCategory::CacheRatio(Window::FiveMinute)
            | MetricCategory::CacheStats(CacheStat::Misses)
    )));
    assert_eq!(value_of(&collection.records, "sda.cache_ratio.hour"), Some(50));
    assert_eq!(collection.errors.len(), 2);
    assert!(collection
        .errors
        .iter()
        .all(|e| matches!(e, CollectError::Parse { .. })));
}

#[test]
fn test_cycles_are_independent() {
    let dir = TempDir::new().unwrap();
    attach_device(dir.path(), "uuid-a", "bdev0", "sda");
    populate_stats(dir.path(), "uuid-a", "bdev0", "1k", 1, 1);

    let collector = collector(dir.path());
    let first = collector.collect();
    assert_eq!(first, collector.collect());

    fs::remove_dir_all(dir.path().join("bcache/uuid-a")).unwrap();
    assert!(collector.collect().is_empty());
}
