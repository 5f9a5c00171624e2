//! Check command implementation.
//!
//! Validates configuration and the bcache sysfs tree.

use anyhow::Result;
use bcache_exporter::topology::{list_backing_devices, list_cache_instances};

use crate::config::{validate_effective_config, Config};
use crate::startup_checks;

/// Validates system requirements and configuration.
pub fn command_check(config: &Config) -> Result<()> {
    println!("🔍 bcache Exporter - System Check");
    println!("==================================");

    let mut all_ok = true;
    let collector_config = config.collector_config();
    let root = &collector_config.sysfs_root;

    println!("\n👤 Checking privileges...");
    if startup_checks::is_root() {
        println!("   ✅ Running as root");
    } else {
        println!("   ⚠️  Not running as root - some sysfs attributes may be unreadable");
    }

    println!("\n📁 Checking {}...", root.display());
    if root.is_dir() {
        println!("   ✅ bcache sysfs present");

        let uuids = list_cache_instances(root);
        if uuids.is_empty() {
            println!("   ⚠️  No cache sets registered");
        }
        for uuid in &uuids {
            let (devices, errors) = list_backing_devices(root, uuid);
            println!("   ├─ cache set {} ({} backing devices)", uuid, devices.len());
            for device in &devices {
                println!("   │  ├─ {} -> {}", device.entry, device.name);
            }
            for e in &errors {
                println!("   │  ❌ {}", e);
                all_ok = false;
            }
        }
    } else {
        println!("   ⚠️  bcache is not loaded - nothing will be collected");
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }
    for key in config.unknown.keys() {
        println!("   ⚠️  Unknown config key: {}", key);
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
