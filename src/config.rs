//! Configuration management for bcache-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use bcache_exporter::{CollectorConfig, DEFAULT_SYSFS_ROOT};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::cli::{Args, ConfigFormat, LogLevel};

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9250;
pub const DEFAULT_INTERVAL_SECONDS: u64 = 10;

/// Every key `Config` accepts, aliases included.
const KNOWN_KEYS: &[&str] = &[
    "verbose",
    "Verbose",
    "sysfs_root",
    "sysfs-root",
    "interval_seconds",
    "interval-seconds",
    "port",
    "bind",
    "log_level",
    "enable_tls",
    "enable-tls",
    "tls_cert_path",
    "tls-cert-path",
    "tls_key_path",
    "tls-key-path",
];

/// Effective configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Collection
    /// Log every collected record
    #[serde(alias = "Verbose")]
    pub verbose: Option<bool>,
    #[serde(alias = "sysfs-root")]
    pub sysfs_root: Option<PathBuf>,
    /// Seconds between cycles in watch mode
    #[serde(alias = "interval-seconds")]
    pub interval_seconds: Option<u64>,

    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,

    /// Keys this version does not know about; reported, never fatal.
    #[serde(skip)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,

    /// File the configuration was loaded from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: Some(false),
            sysfs_root: Some(PathBuf::from(DEFAULT_SYSFS_ROOT)),
            interval_seconds: Some(DEFAULT_INTERVAL_SECONDS),
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
            unknown: BTreeMap::new(),
            source: None,
        }
    }
}

impl Config {
    /// Settings the collector is constructed with.
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            sysfs_root: self
                .sysfs_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SYSFS_ROOT)),
            verbose: self.verbose.unwrap_or(false),
        }
    }

    /// Effective log level; `info` when unset.
    pub fn log_level(&self) -> Result<LogLevel, String> {
        match self.log_level.as_deref() {
            Some(level) => LogLevel::from_str(level, true)
                .map_err(|_| format!("Invalid log_level '{}'", level)),
            None => Ok(LogLevel::Info),
        }
    }

    /// Logs a warning for every unrecognized key.
    pub fn warn_unknown_keys(&self) {
        for key in self.unknown.keys() {
            warn!("bcache plugin: Unknown config key: {}.", key);
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.port == Some(0) {
        return Err("port must be between 1 and 65535".into());
    }

    cfg.log_level()?;

    if cfg.interval_seconds == Some(0) {
        return Err("interval_seconds must be at least 1".into());
    }

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", bind).into());
        }
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        match (cfg.tls_cert_path.as_deref(), cfg.tls_key_path.as_deref()) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

fn check_pem_file(path: &str, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", what, path).into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("TLS {} file not found: {}", what, path).into())
        }
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", what, path, e).into()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if args.verbose {
        config.verbose = Some(true);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }
    if let Some(root) = &args.sysfs_root {
        config.sysfs_root = Some(root.clone());
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Configuration loading with multiple format support.
///
/// Without an explicit path the default locations are tried in order; if none
/// exists the built-in defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/bcache-exporter/config.yaml",
                "/etc/bcache-exporter/config.yml",
                "/etc/bcache-exporter/config.json",
                "./bcache-exporter.yaml",
                "./bcache-exporter.yml",
                "./bcache-exporter.json",
            ];

            match defaults.iter().map(Path::new).find(|p| p.exists()) {
                Some(p) => p.to_path_buf(),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
    let mut config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    config.source = Some(path);
    Ok(config)
}

/// Parses config text; the format is chosen by file extension, YAML by default.
pub fn parse_config(
    content: &str,
    extension: Option<&str>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let (mut config, raw): (Config, BTreeMap<String, serde_yaml::Value>) = match extension {
        Some("json") => (serde_json::from_str(content)?, serde_json::from_str(content)?),
        Some("toml") => (toml::from_str(content)?, toml::from_str(content)?),
        _ => (serde_yaml::from_str(content)?, serde_yaml::from_str(content)?),
    };

    config.unknown = raw
        .into_iter()
        .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()))
        .collect();
    Ok(config)
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_effective_config(&config).is_ok());
        assert_eq!(config.collector_config(), CollectorConfig::default());
    }

    #[test]
    fn test_parse_yaml_with_collectd_style_key() {
        let config = parse_config("Verbose: true\nport: 9300\n", Some("yaml")).unwrap();
        assert_eq!(config.verbose, Some(true));
        assert_eq!(config.port, Some(9300));
        assert!(config.unknown.is_empty());
        assert!(config.collector_config().verbose);
    }

    #[test]
    fn test_unknown_keys_are_collected_not_rejected() {
        let config = parse_config("verbose: false\nInterval: 30\nfoo: bar\n", None).unwrap();
        let keys: Vec<&str> = config.unknown.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Interval", "foo"]);
    }

    #[test]
    fn test_parse_json_and_toml() {
        let json = parse_config(r#"{"sysfs_root": "/tmp/bcache", "extra": 1}"#, Some("json"))
            .unwrap();
        assert_eq!(json.sysfs_root, Some(PathBuf::from("/tmp/bcache")));
        assert!(json.unknown.contains_key("extra"));

        let toml = parse_config("interval_seconds = 5\n", Some("toml")).unwrap();
        assert_eq!(toml.interval_seconds, Some(5));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = Config {
            interval_seconds: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());

        let config = Config {
            bind: Some("not-an-ip".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());

        let config = Config {
            enable_tls: Some(true),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_log_level_from_file_and_cli() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bcache-exporter.yaml");
        fs::write(&path, "log_level: debug\n").unwrap();
        let path_arg = path.to_string_lossy().to_string();

        let args = Args::parse_from(["bcache-exporter", "-c", path_arg.as_str()]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.log_level(), Ok(LogLevel::Debug));
        assert_eq!(config.source, Some(path.clone()));

        let args = Args::parse_from([
            "bcache-exporter",
            "-c",
            path_arg.as_str(),
            "--log-level",
            "warn",
        ]);
        assert_eq!(resolve_config(&args).unwrap().log_level(), Ok(LogLevel::Warn));

        let args = Args::parse_from(["bcache-exporter", "--no-config"]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.log_level(), Ok(LogLevel::Info));
        assert_eq!(config.source, None);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let config = parse_config("log_level: loud\n", None).unwrap();
        assert!(config.log_level().is_err());
        assert!(validate_effective_config(&config).is_err());

        let config = parse_config("log_level: DEBUG\n", None).unwrap();
        assert_eq!(config.log_level(), Ok(LogLevel::Debug));
    }

    #[test]
    fn test_rendered_config_omits_unknown_keys() {
        let mut config = Config::default();
        config
            .unknown
            .insert("stray".into(), serde_yaml::Value::Bool(true));
        let yaml = render_config(&config, &ConfigFormat::Yaml).unwrap();
        assert!(!yaml.contains("stray"));
        assert!(yaml.contains("sysfs_root"));
    }
}
