//! Discovery of bcache cache instances and their backing devices.
//!
//! Layout under the sysfs root (normally `/sys/fs/bcache`):
//! - `<uuid>/` one directory per cache set
//! - `<uuid>/bdev<N>/` one entry per attached backing device
//! - `<uuid>/bdev<N>/dev` symlink to the block device node
//!
//! Topology is rescanned on every collection cycle. Entries are returned in
//! name order so that "first" and "last" device mean the same thing for the
//! whole cycle.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::CollectError;

/// Prefix of the per-device entries inside a cache set directory.
pub const BDEV_PREFIX: &str = "bdev";

/// A backing device attached to a cache set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingDevice {
    /// Entry name under the cache set directory, e.g. `bdev0`.
    pub entry: String,
    /// Kernel block device name, e.g. `sda`.
    pub name: String,
}

/// Lists the cache set UUIDs present under `root`.
///
/// A missing root means bcache is not loaded on this host, which is logged
/// once and yields no instances.
pub fn list_cache_instances(root: &Path) -> Vec<String> {
    if !root.is_dir() {
        info!("bcache is not loaded ({} not found)", root.display());
        return Vec::new();
    }

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    // The root also holds the `register` and `register_quiet` control files
    let mut uuids: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    uuids.sort();

    debug!("Found {} bcache cache set(s)", uuids.len());
    uuids
}

/// Names of the `bdev*` entries of one cache set, sorted.
///
/// An unreadable cache set directory (detached mid-scan) has no entries.
pub fn bdev_entries(root: &Path, uuid: &str) -> Vec<String> {
    let entries = match fs::read_dir(root.join(uuid)) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list cache set {}: {}", uuid, e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with(BDEV_PREFIX))
        .collect();
    names.sort();
    names
}

/// Resolves every backing device of a cache set to its block device name.
///
/// Devices whose `dev` link cannot be resolved are left out of the result
/// and reported in the returned error list.
pub fn list_backing_devices(
    root: &Path,
    uuid: &str,
) -> (Vec<BackingDevice>, Vec<CollectError>) {
    let mut devices = Vec::new();
    let mut errors = Vec::new();

    for entry in bdev_entries(root, uuid) {
        match resolve_device_name(&root.join(uuid).join(&entry).join("dev")) {
            Ok(name) => devices.push(BackingDevice { entry, name }),
            Err(e) => {
                warn!("Skipping backing device {}/{}: {}", uuid, entry, e);
                errors.push(e);
            }
        }
    }

    (devices, errors)
}

/// Follows the `dev` link and returns the final component of its target.
fn resolve_device_name(link: &Path) -> Result<String, CollectError> {
    let target = fs::canonicalize(link).map_err(|source| CollectError::DeviceLink {
        path: link.to_path_buf(),
        source,
    })?;

    target
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| CollectError::DeviceLink {
            path: link.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, "link target has no file name"),
        })
}
