//! bcache-exporter - version 0.1.0
//!
//! Exporter for bcache statistics with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod metrics;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use bcache_exporter::{BcacheCollector, ScrapeStats};
use clap::Parser;
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal, sync::Mutex};
use tracing::{debug, error, info, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_once, command_watch};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{config_handler, health_handler, metrics_handler, records_handler, root_handler};
use metrics::BcacheMetrics;
use state::AppState;

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr so that record output on stdout stays machine-readable.
fn setup_logging(level: LogLevel) {
    let log_level = match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<(Config, LogLevel), Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    let level = config.log_level()?;
    Ok((config, level))
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Runs the HTTP server until a shutdown signal arrives.
async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting bcache-exporter");

    let collector_config = config.collector_config();
    startup_checks::validate_requirements(&collector_config.sysfs_root);

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR).to_string();
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let registry = Registry::new();
    let metrics = BcacheMetrics::new(&registry)?;
    debug!("All metrics registered successfully");

    let state = Arc::new(AppState {
        registry,
        metrics,
        collector: BcacheCollector::new(collector_config),
        config: Arc::new(config.clone()),
        scrape_stats: Arc::new(ScrapeStats::new()),
        scrape_lock: Mutex::new(()),
        start_time: Instant::now(),
    });

    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/records", get(records_handler))
        .route("/health", get(health_handler))
        .route("/config", get(config_handler))
        .with_state(state);

    match (
        config.enable_tls.unwrap_or(false),
        config.tls_cert_path.as_deref(),
        config.tls_key_path.as_deref(),
    ) {
        (true, Some(cert_path), Some(key_path)) => {
            info!("Loading TLS certificate from: {}", cert_path);
            info!("Loading TLS private key from: {}", key_path);

            let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
                .await
                .map_err(|e| {
                    error!("Failed to load TLS configuration: {}", e);
                    e
                })?;

            info!(
                "bcache-exporter listening on https://{}:{}",
                bind_ip_str, port
            );

            let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());

            tokio::select! {
                result = server => {
                    if let Err(e) = result {
                        error!("Server error: {}", e);
                        return Err(e.into());
                    }
                }
                _ = shutdown_signal() => {
                    info!("Shutdown signal received, exiting...");
                }
            }
        }
        _ => {
            let listener = TcpListener::bind(addr).await?;
            info!(
                "bcache-exporter listening on http://{}:{}",
                bind_ip_str, port
            );

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    info!("bcache-exporter stopped gracefully");
    Ok(())
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            for key in config.unknown.keys() {
                eprintln!("⚠️  Unknown config key: {}", key);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Config generation needs neither logging nor an existing config
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return Ok(command_config(output.clone(), format.clone(), *commented)?);
    }

    let (config, log_level) = load_validated_config(&args)?;
    setup_logging(log_level);
    match &config.source {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => debug!("No config file loaded, using built-in defaults"),
    }
    config.warn_unknown_keys();

    match &args.command {
        Some(Commands::Once { format }) => Ok(command_once(*format, &config)?),
        Some(Commands::Watch { interval, count }) => {
            Ok(command_watch(*interval, *count, &config).await?)
        }
        Some(Commands::Check) => Ok(command_check(&config)?),
        Some(Commands::Config { .. }) => unreachable!("Config handled above"),
        Some(Commands::Serve) | None => serve(config).await,
    }
}
