//! Running statistics about the exporter's own collection cycles.
//!
//! Collection itself keeps no state between cycles; these counters describe
//! the exporter process (how many cycles ran, how long they took, how many
//! statistics had to be skipped) and back the `/health` endpoint.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Instant, SystemTime};

use crate::collector::Collection;

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            *self = RunningStat {
                count: 1,
                sum: value,
                min: value,
                max: value,
                last: value,
            };
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns `(last, avg, max, min, count)`.
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Exporter-level statistics shared between HTTP handlers.
pub struct ScrapeStats {
    pub cycle_duration_seconds: Stat,
    pub records_per_cycle: Stat,
    pub total_cycles: AtomicU64,
    pub total_errors: AtomicU64,
    pub http_requests: AtomicU64,
    pub start_time: Instant,
    pub last_cycle_time: StdRwLock<Option<SystemTime>>,
}

impl Default for ScrapeStats {
    fn default() -> Self {
        Self {
            cycle_duration_seconds: Stat::default(),
            records_per_cycle: Stat::default(),
            total_cycles: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            http_requests: AtomicU64::new(0),
            start_time: Instant::now(),
            last_cycle_time: StdRwLock::new(None),
        }
    }
}

impl ScrapeStats {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records the outcome of one collection cycle.
    pub fn record_cycle(&self, collection: &Collection, duration_seconds: f64) {
        self.cycle_duration_seconds.add_sample(duration_seconds);
        self.records_per_cycle
            .add_sample(collection.records.len() as f64);
        self.total_cycles.fetch_add(1, Ordering::Relaxed);
        self.total_errors
            .fetch_add(collection.errors.len() as u64, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_cycle_time.write() {
            *guard = Some(SystemTime::now());
        }
    }

    pub fn record_http_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Wall-clock time of the last cycle as `HH:MM:SS` UTC, or `N/A`.
    pub fn get_last_cycle_time_str(&self) -> String {
        const SECS_PER_DAY: u64 = 86400;
        const SECS_PER_HOUR: u64 = 3600;
        const SECS_PER_MINUTE: u64 = 60;

        let last = match self.last_cycle_time.read() {
            Ok(guard) => *guard,
            Err(_) => None,
        };

        match last.and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok()) {
            Some(since_epoch) => {
                let secs = since_epoch.as_secs();
                format!(
                    "{:02}:{:02}:{:02}",
                    (secs % SECS_PER_DAY) / SECS_PER_HOUR,
                    (secs % SECS_PER_HOUR) / SECS_PER_MINUTE,
                    secs % SECS_PER_MINUTE
                )
            }
            None => "N/A".to_string(),
        }
    }

    pub fn render_table(&self) -> String {
        let (cd_cur, cd_avg, cd_max, cd_min, _) = self.cycle_duration_seconds.snapshot();
        let (rc_cur, rc_avg, rc_max, rc_min, _) = self.records_per_cycle.snapshot();
        let cycles = self.total_cycles.load(Ordering::Relaxed);
        let errors = self.total_errors.load(Ordering::Relaxed);
        let requests = self.http_requests.load(Ordering::Relaxed);

        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - EXPORTER INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "COLLECTION CYCLES").ok();
        writeln!(out, "------------------").ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "cycle_duration (s)",
            format!("{:.3}", cd_cur),
            format!("{:.3}", cd_avg),
            format!("{:.3}", cd_max),
            format!("{:.3}", cd_min),
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "records_per_cycle",
            format!("{:.0}", rc_cur),
            format!("{:.1}", rc_avg),
            format!("{:.0}", rc_max),
            format!("{:.0}", rc_min),
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "TOTALS").ok();
        writeln!(out, "------").ok();
        writeln!(out, "{:left$} | {}", "cycles", cycles, left = left_col).ok();
        writeln!(out, "{:left$} | {}", "skipped_statistics", errors, left = left_col).ok();
        writeln!(out, "{:left$} | {}", "http_requests", requests, left = left_col).ok();
        writeln!(
            out,
            "{:left$} | {}",
            "last_cycle (UTC)",
            self.get_last_cycle_time_str(),
            left = left_col
        )
        .ok();

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stat() {
        let mut stat = RunningStat::default();
        assert_eq!(stat.avg(), 0.0);

        stat.add(2.0);
        stat.add(4.0);
        stat.add(0.0);
        assert_eq!(stat.count, 3);
        assert_eq!(stat.min, 0.0);
        assert_eq!(stat.max, 4.0);
        assert_eq!(stat.last, 0.0);
        assert_eq!(stat.avg(), 2.0);
    }

    #[test]
    fn test_last_cycle_time_before_any_cycle() {
        let stats = ScrapeStats::new();
        assert_eq!(stats.get_last_cycle_time_str(), "N/A");
    }
}
