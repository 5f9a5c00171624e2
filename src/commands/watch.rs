//! Watch command implementation.
//!
//! Collects on a fixed interval and prints every record in graphite
//! plaintext format: `bcache.<name> <value> <unix-timestamp>`.

use anyhow::Result;
use bcache_exporter::naming::{METRIC_DELIM, PLUGIN_NAME};
use bcache_exporter::{BcacheCollector, Collection, MetricRecord};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::{signal, time};
use tracing::{info, warn};

use crate::config::{Config, DEFAULT_INTERVAL_SECONDS};

/// Runs collection cycles until interrupted or `count` cycles have run.
pub async fn command_watch(interval: Option<u64>, count: u64, config: &Config) -> Result<()> {
    let seconds = interval
        .or(config.interval_seconds)
        .unwrap_or(DEFAULT_INTERVAL_SECONDS)
        .max(1);
    let collector = BcacheCollector::new(config.collector_config());

    info!("Collecting bcache statistics every {}s", seconds);
    let interrupted = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received SIGINT (Ctrl+C), stopping watch");
    };

    watch_loop(
        collector,
        Duration::from_secs(seconds),
        count,
        interrupted,
        |collection| {
            let now = Utc::now();
            for record in &collection.records {
                println!("{}", graphite_line(record, now));
            }
        },
    )
    .await?;
    Ok(())
}

/// Drives cycles until `shutdown` resolves or `count` cycles have run
/// (0 = unbounded). Returns the number of completed cycles.
///
/// `shutdown` is polled across the whole loop, so a signal that arrives
/// while a cycle is running stops the loop before the next one starts.
pub async fn watch_loop<S, F>(
    collector: BcacheCollector,
    period: Duration,
    count: u64,
    shutdown: S,
    mut on_cycle: F,
) -> Result<u64>
where
    S: Future<Output = ()>,
    F: FnMut(&Collection),
{
    tokio::pin!(shutdown);
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    let mut cycles = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return Ok(cycles),
            _ = ticker.tick() => {}
        }

        let cycle = collector.clone();
        let collection = tokio::select! {
            biased;
            _ = &mut shutdown => return Ok(cycles),
            joined = tokio::task::spawn_blocking(move || cycle.collect_with_errors()) => joined?,
        };
        for e in &collection.errors {
            warn!("{}", e);
        }
        on_cycle(&collection);

        cycles += 1;
        if count > 0 && cycles >= count {
            return Ok(cycles);
        }
    }
}

/// Formats one record as a graphite plaintext line.
pub fn graphite_line(record: &MetricRecord, at: DateTime<Utc>) -> String {
    format!(
        "{}{}{} {} {}",
        PLUGIN_NAME,
        METRIC_DELIM,
        record.name(),
        record.value,
        at.timestamp()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcache_exporter::{CacheStat, CollectorConfig, MetricCategory, MetricKey};
    use chrono::TimeZone;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    fn empty_collector(dir: &TempDir) -> BcacheCollector {
        BcacheCollector::new(CollectorConfig {
            sysfs_root: dir.path().to_path_buf(),
            verbose: false,
        })
    }

    #[test]
    fn test_graphite_line() {
        let record = MetricRecord::gauge(
            MetricKey::new("sdb", MetricCategory::CacheStats(CacheStat::Readaheads)),
            7,
        );
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        assert_eq!(
            graphite_line(&record, at),
            "bcache.sdb.cache_stats.readaheads 7 1700000000"
        );
    }

    #[tokio::test]
    async fn test_shutdown_during_cycle_stops_loop() {
        let dir = TempDir::new().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let mut tx = Some(tx);

        // The signal fires while the first cycle is being handled; the loop
        // must not wait out the 1 hour period for a second tick.
        let cycles = watch_loop(
            empty_collector(&dir),
            Duration::from_secs(3600),
            0,
            async move {
                let _ = rx.await;
            },
            |_| {
                if let Some(tx) = tx.take() {
                    let _ = tx.send(());
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(cycles, 1);
    }

    #[tokio::test]
    async fn test_count_limits_cycles() {
        let dir = TempDir::new().unwrap();
        let mut seen = 0;

        let cycles = watch_loop(
            empty_collector(&dir),
            Duration::from_millis(1),
            3,
            std::future::pending::<()>(),
            |collection| {
                assert!(collection.records.is_empty());
                seen += 1;
            },
        )
        .await
        .unwrap();

        assert_eq!(cycles, 3);
        assert_eq!(seen, 3);
    }
}
