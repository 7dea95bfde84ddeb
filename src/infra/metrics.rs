//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for all counter updates so recording never contends with
//! reporting. All atomics use Relaxed ordering: these are statistical
//! counters only, never used for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for the refresh pipeline
pub struct Metrics {
    /// Total refresh cycles ever started (monotonic)
    cycles_total: AtomicU64,
    /// Cycles since last report (reset on report)
    cycles_since_report: AtomicU64,
    /// Fetch failures (monotonic)
    fetch_failures: AtomicU64,
    /// Parse failures (monotonic)
    parse_failures: AtomicU64,
    /// Cycles that returned a well-formed but empty series (monotonic)
    empty_batches: AtomicU64,
    /// Points delivered by the most recent successful cycle
    points_last: AtomicU64,
    /// Wall-clock duration of the most recent successful cycle
    last_cycle_ms: AtomicU64,
    started: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            cycles_total: AtomicU64::new(0),
            cycles_since_report: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            parse_failures: AtomicU64::new(0),
            empty_batches: AtomicU64::new(0),
            points_last: AtomicU64::new(0),
            last_cycle_ms: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_cycle_started(&self) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.cycles_since_report.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_batch(&self) {
        self.empty_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle_complete(&self, points: u64, elapsed_ms: u64) {
        self.points_last.store(points, Ordering::Relaxed);
        self.last_cycle_ms.store(elapsed_ms, Ordering::Relaxed);
    }

    /// Snapshot current values; resets the per-report cycle counter
    pub fn report(&self) -> MetricsSummary {
        MetricsSummary {
            uptime_secs: self.started.elapsed().as_secs(),
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            cycles_recent: self.cycles_since_report.swap(0, Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            empty_batches: self.empty_batches.load(Ordering::Relaxed),
            points_last: self.points_last.load(Ordering::Relaxed),
            last_cycle_ms: self.last_cycle_ms.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub uptime_secs: u64,
    pub cycles_total: u64,
    pub cycles_recent: u64,
    pub fetch_failures: u64,
    pub parse_failures: u64,
    pub empty_batches: u64,
    pub points_last: u64,
    pub last_cycle_ms: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            uptime_secs = self.uptime_secs,
            cycles_total = self.cycles_total,
            cycles_recent = self.cycles_recent,
            fetch_failures = self.fetch_failures,
            parse_failures = self.parse_failures,
            empty_batches = self.empty_batches,
            points_last = self.points_last,
            last_cycle_ms = self.last_cycle_ms,
            "metrics_summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.record_cycle_started();
        metrics.record_cycle_started();
        metrics.record_fetch_failure();
        metrics.record_parse_failure();
        metrics.record_empty_batch();
        metrics.record_cycle_complete(42, 17);

        let summary = metrics.report();
        assert_eq!(summary.cycles_total, 2);
        assert_eq!(summary.cycles_recent, 2);
        assert_eq!(summary.fetch_failures, 1);
        assert_eq!(summary.parse_failures, 1);
        assert_eq!(summary.empty_batches, 1);
        assert_eq!(summary.points_last, 42);
        assert_eq!(summary.last_cycle_ms, 17);
    }

    #[test]
    fn test_recent_cycles_reset_on_report() {
        let metrics = Metrics::new();
        metrics.record_cycle_started();
        assert_eq!(metrics.report().cycles_recent, 1);
        assert_eq!(metrics.report().cycles_recent, 0);
        assert_eq!(metrics.report().cycles_total, 1);
    }
}
