//! Startup requirement validation for bcache-exporter.
//!
//! None of these checks are fatal: a host without bcache, or an exporter
//! running unprivileged, still serves whatever can be read.

use nix::unistd::geteuid;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Returns true when the effective user is root.
pub fn is_root() -> bool {
    geteuid().is_root()
}

/// Validate runtime requirements, logging what was found.
pub fn validate_requirements(sysfs_root: &Path) {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_sysfs_access(sysfs_root);
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if is_root() {
        info!("✅ Running as root (uid=0)");
    } else {
        warn!("⚠️  Not running as root - some bcache attributes may be unreadable");
    }
}

/// Check that the bcache sysfs root can be listed
fn check_sysfs_access(root: &Path) {
    if !root.exists() {
        info!(
            "bcache is not loaded ({} not found) - metrics will be empty until it is",
            root.display()
        );
        return;
    }

    match fs::read_dir(root) {
        Ok(entries) => {
            let cache_sets = entries.flatten().filter(|e| e.path().is_dir()).count();
            info!(
                "✅ {} readable, {} cache set(s) registered",
                root.display(),
                cache_sets
            );
        }
        Err(e) => {
            warn!("⚠️  Cannot list {}: {}", root.display(), e);
        }
    }

    if let Ok(version) = fs::read_to_string("/proc/version") {
        debug!("Kernel version: {}", version.lines().next().unwrap_or("unknown"));
    }
}
