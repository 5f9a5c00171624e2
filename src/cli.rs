//! CLI arguments and subcommands for bcache-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for collected records
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RecordFormat {
    /// `<name> <value> <type>` per line
    Text,
    /// JSON array of records
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "bcache-exporter",
    about = "Exporter for bcache cache-hit, dirty-data and bypass statistics",
    long_about = "Exporter for bcache cache-hit, dirty-data and bypass statistics.\n\n\
                  Reads the counters bcache exposes under /sys/fs/bcache for every cache set \
                  and backing device, and publishes them as gauges over HTTP or on stdout.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides config, default: info)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Log every collected record
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Directory holding the bcache cache sets
    #[arg(long)]
    pub sysfs_root: Option<PathBuf>,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve metrics over HTTP (default)
    Serve,

    /// Run one collection cycle and print the records
    Once {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: RecordFormat,
    },

    /// Collect repeatedly and print records in graphite plaintext format
    Watch {
        /// Seconds between cycles (overrides config)
        #[arg(short = 'i', long)]
        interval: Option<u64>,

        /// Stop after N cycles (0 = run until interrupted)
        #[arg(short = 'n', long, default_value_t = 0)]
        count: u64,
    },

    /// Validate configuration and bcache sysfs access
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}
