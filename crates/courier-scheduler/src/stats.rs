//! Scheduler counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Scheduler counters, updated with relaxed atomics.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    /// Jobs registered.
    pub scheduled: AtomicU64,

    /// Jobs displaced by a newer job for the same message.
    pub replaced: AtomicU64,

    /// Jobs removed before firing.
    pub cancelled: AtomicU64,

    /// Messages handed to the notifier.
    pub delivered: AtomicU64,

    /// Timers that fired for a message that no longer existed.
    pub stale: AtomicU64,

    /// Deliveries aborted by a store or directory error.
    pub failed: AtomicU64,

    /// Schedule requests the timer engine refused.
    pub schedule_failures: AtomicU64,
}

impl SchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_replaced(&self) {
        self.replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_schedule_failure(&self) {
        self.schedule_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of the counters.
    pub fn snapshot(&self) -> SchedulerStatsSnapshot {
        SchedulerStatsSnapshot {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            schedule_failures: self.schedule_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`SchedulerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStatsSnapshot {
    pub scheduled: u64,
    pub replaced: u64,
    pub cancelled: u64,
    pub delivered: u64,
    pub stale: u64,
    pub failed: u64,
    pub schedule_failures: u64,
}
