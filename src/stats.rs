//! Per-cache-set statistic readers.
//!
//! Each reader works on one cache set UUID and walks its `bdev*` entries.
//! The aggregation policy differs per statistic and is kept as the metrics
//! consumers expect it:
//!
//! | statistic    | policy                                   |
//! |--------------|------------------------------------------|
//! | dirty data   | sum over all backing devices             |
//! | cache ratio  | first backing device only                |
//! | cache stats  | last backing device visited wins         |
//! | bypassed     | last backing device visited wins         |
//!
//! An absent attribute (window not elapsed yet, device detached) reads as
//! zero. It is logged at info when `verbose` is set, at debug otherwise.
//! Text that is present but not numeric is returned as an error.

use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::error::CollectError;
use crate::sysfs::read_first_line;
use crate::topology::bdev_entries;
use crate::units::{parse_counter, parse_size_token, ParseError};

/// Ratio reported when a window saw neither hits nor misses.
pub const IDLE_CACHE_RATIO: f64 = 100.0;

/// Time window of the bcache `stats_*` directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    FiveMinute,
    Hour,
    Day,
    Total,
}

impl Window {
    /// All windows in emission order.
    pub const ALL: [Window; 4] = [Window::FiveMinute, Window::Hour, Window::Day, Window::Total];

    pub fn as_str(&self) -> &'static str {
        match self {
            Window::FiveMinute => "five_minute",
            Window::Hour => "hour",
            Window::Day => "day",
            Window::Total => "total",
        }
    }

    /// Name of the sysfs directory holding this window's counters.
    pub fn dir_name(&self) -> String {
        format!("stats_{}", self.as_str())
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five-minute cache event counters (`stats_five_minute/cache_<stat>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStat {
    BypassHits,
    BypassMisses,
    Hits,
    MissCollisions,
    Misses,
    Readaheads,
}

impl CacheStat {
    /// All counters in emission order.
    pub const ALL: [CacheStat; 6] = [
        CacheStat::BypassHits,
        CacheStat::BypassMisses,
        CacheStat::Hits,
        CacheStat::MissCollisions,
        CacheStat::Misses,
        CacheStat::Readaheads,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStat::BypassHits => "bypass_hits",
            CacheStat::BypassMisses => "bypass_misses",
            CacheStat::Hits => "hits",
            CacheStat::MissCollisions => "miss_collisions",
            CacheStat::Misses => "misses",
            CacheStat::Readaheads => "readaheads",
        }
    }

    /// Name of the attribute file, e.g. `cache_bypass_hits`.
    pub fn file_name(&self) -> String {
        format!("cache_{}", self.as_str())
    }
}

impl fmt::Display for CacheStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total dirty data of a cache set in bytes, summed over its backing devices.
pub fn get_dirty_data(root: &Path, uuid: &str, verbose: bool) -> Result<u64, CollectError> {
    let mut dirty_data: u64 = 0;
    for bdev in bdev_entries(root, uuid) {
        let path = root.join(uuid).join(&bdev).join("dirty_data");
        let bytes = read_value(&path, parse_size_token, verbose)?;
        dirty_data = dirty_data.saturating_add(bytes);
    }
    Ok(dirty_data)
}

/// Cache hit ratio in percent for `window`, taken from the first backing device.
///
/// A cache set without backing devices has a ratio of 0; a window with no
/// traffic at all has a ratio of [`IDLE_CACHE_RATIO`].
pub fn get_cache_ratio(
    root: &Path,
    uuid: &str,
    window: Window,
    verbose: bool,
) -> Result<f64, CollectError> {
    let Some(bdev) = bdev_entries(root, uuid).into_iter().next() else {
        return Ok(0.0);
    };

    let stats_dir = root.join(uuid).join(bdev).join(window.dir_name());
    let hits = read_value(&stats_dir.join("cache_hits"), parse_counter, verbose)? as f64;
    let misses = read_value(&stats_dir.join("cache_misses"), parse_counter, verbose)? as f64;

    if hits + misses == 0.0 {
        return Ok(IDLE_CACHE_RATIO);
    }
    Ok(hits / (hits + misses) * 100.0)
}

/// Five-minute value of a cache event counter; the last backing device visited wins.
pub fn get_cache_result(
    root: &Path,
    uuid: &str,
    stat: CacheStat,
    verbose: bool,
) -> Result<u64, CollectError> {
    let file = stat.file_name();
    last_bdev_value(root, uuid, |bdev_dir| {
        read_value(
            &bdev_dir.join(Window::FiveMinute.dir_name()).join(&file),
            parse_counter,
            verbose,
        )
    })
}

/// Bytes that bypassed the cache in the last five minutes; the last backing device visited wins.
pub fn get_bypassed(root: &Path, uuid: &str, verbose: bool) -> Result<u64, CollectError> {
    last_bdev_value(root, uuid, |bdev_dir| {
        read_value(
            &bdev_dir.join(Window::FiveMinute.dir_name()).join("bypassed"),
            parse_size_token,
            verbose,
        )
    })
}

fn last_bdev_value<F>(root: &Path, uuid: &str, read: F) -> Result<u64, CollectError>
where
    F: Fn(&Path) -> Result<u64, CollectError>,
{
    let mut value = 0;
    for bdev in bdev_entries(root, uuid) {
        value = read(&root.join(uuid).join(bdev))?;
    }
    Ok(value)
}

fn read_value<F>(path: &Path, parse: F, verbose: bool) -> Result<u64, CollectError>
where
    F: Fn(&str) -> Result<u64, ParseError>,
{
    let text = read_first_line(path);
    if text.is_empty() {
        if verbose {
            info!("bcache [verbose]: {} absent or empty, reading as 0", path.display());
        } else {
            debug!("{} absent or empty, reading as 0", path.display());
        }
    }
    parse(&text).map_err(|source| CollectError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
