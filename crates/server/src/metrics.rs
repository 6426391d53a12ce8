//! Lock-free physics counters.
//!
//! Tick drivers update these with atomic adds; readers take a serializable
//! snapshot at their own pace.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

use crate::physics::TickStats;

pub struct Metrics {
    ticks: AtomicU64,
    entries_processed: AtomicU64,
    entries_removed: AtomicU64,
    updates_applied: AtomicU64,
    deltas_sent: AtomicU64,
    handler_faults: AtomicU64,
    tick_ns_sum: AtomicU64,

    // Tick duration histogram
    hist_under_100us: AtomicU64,
    hist_100us_1ms: AtomicU64,
    hist_1_10ms: AtomicU64,
    hist_10_100ms: AtomicU64,
    hist_over_100ms: AtomicU64,

    levels_loaded: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            entries_processed: AtomicU64::new(0),
            entries_removed: AtomicU64::new(0),
            updates_applied: AtomicU64::new(0),
            deltas_sent: AtomicU64::new(0),
            handler_faults: AtomicU64::new(0),
            tick_ns_sum: AtomicU64::new(0),
            hist_under_100us: AtomicU64::new(0),
            hist_100us_1ms: AtomicU64::new(0),
            hist_1_10ms: AtomicU64::new(0),
            hist_10_100ms: AtomicU64::new(0),
            hist_over_100ms: AtomicU64::new(0),
            levels_loaded: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Called after every level tick.
    pub fn record_tick(&self, stats: &TickStats, duration: Duration) {
        self.ticks.fetch_add(1, Relaxed);
        self.entries_processed.fetch_add(stats.processed as u64, Relaxed);
        self.entries_removed.fetch_add(stats.removed as u64, Relaxed);
        self.updates_applied.fetch_add(stats.applied as u64, Relaxed);
        self.deltas_sent.fetch_add(stats.sent as u64, Relaxed);
        self.handler_faults.fetch_add(stats.faults as u64, Relaxed);
        self.tick_ns_sum.fetch_add(duration.as_nanos() as u64, Relaxed);

        let bucket = match duration.as_micros() as u64 {
            0..=99 => &self.hist_under_100us,
            100..=999 => &self.hist_100us_1ms,
            1_000..=9_999 => &self.hist_1_10ms,
            10_000..=99_999 => &self.hist_10_100ms,
            _ => &self.hist_over_100ms,
        };
        bucket.fetch_add(1, Relaxed);
    }

    pub fn level_loaded(&self) {
        self.levels_loaded.fetch_add(1, Relaxed);
    }

    pub fn level_unloaded(&self) {
        self.levels_loaded.fetch_sub(1, Relaxed);
    }

    /// `worklist_entries` and `rejected` are summed over the loaded levels
    /// by the caller.
    pub fn snapshot(&self, worklist_entries: u64, rejected: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            ticks_total: self.ticks.load(Relaxed),
            entries_processed: self.entries_processed.load(Relaxed),
            entries_removed: self.entries_removed.load(Relaxed),
            updates_applied: self.updates_applied.load(Relaxed),
            deltas_sent: self.deltas_sent.load(Relaxed),
            handler_faults: self.handler_faults.load(Relaxed),
            tick_ns_sum: self.tick_ns_sum.load(Relaxed),
            levels_loaded: self.levels_loaded.load(Relaxed),
            worklist_entries,
            rejected,
            hist: [
                self.hist_under_100us.load(Relaxed),
                self.hist_100us_1ms.load(Relaxed),
                self.hist_1_10ms.load(Relaxed),
                self.hist_10_100ms.load(Relaxed),
                self.hist_over_100ms.load(Relaxed),
            ],
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of every counter. Rates come from diffing two.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub ticks_total: u64,
    pub entries_processed: u64,
    pub entries_removed: u64,
    pub updates_applied: u64,
    pub deltas_sent: u64,
    pub handler_faults: u64,
    pub tick_ns_sum: u64,
    pub levels_loaded: u64,
    pub worklist_entries: u64,
    pub rejected: u64,
    /// `[<100μs, 100μs-1ms, 1-10ms, 10-100ms, >100ms]`
    pub hist: [u64; 5],
}
