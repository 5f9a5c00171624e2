//! Config command implementation.
//!
//! Generates configuration files in various formats.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(output: Option<PathBuf>, format: ConfigFormat, commented: bool) -> Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("bcache-exporter.yaml"));

    let mut content = render_config(&config, &format).map_err(|e| anyhow::anyhow!("{}", e))?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# bcache Exporter Configuration
# ==============================
#
# Collection
# ----------
# verbose: false               # Log every collected record (alias: Verbose)
# sysfs_root: /sys/fs/bcache   # Directory holding one subdirectory per cache set
# interval_seconds: 10         # Seconds between cycles in watch mode
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9250                   # HTTP port
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace (--log-level wins)
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
#
# Unknown keys are reported with a warning and otherwise ignored.
"#;

    format!("{comments}\n{yaml}")
}
