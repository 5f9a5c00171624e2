//! CLI command implementations for bcache-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `once`: One collection cycle printed to stdout
//! - `watch`: Periodic collection in graphite plaintext format
//! - `check`: System validation
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod once;
pub mod watch;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use once::command_once;
pub use watch::command_watch;
