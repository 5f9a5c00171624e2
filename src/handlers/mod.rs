//! HTTP endpoint handlers for the exporter.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Landing page listing the endpoints
//! - `/metrics`: Prometheus metrics endpoint
//! - `/records`: Raw dotted records of one collection cycle (JSON)
//! - `/health`: Exporter health and cycle statistics
//! - `/config`: Effective configuration

pub mod config;
pub mod health;
pub mod metrics;
pub mod records;
pub mod root;

// Re-export handlers
pub use config::config_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use records::records_handler;
pub use root::root_handler;
