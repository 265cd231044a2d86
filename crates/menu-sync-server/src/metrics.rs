use crate::time::now_ms;
use menu_proto::StatsV1;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// Process-wide counters reported by STATS.
pub struct Metrics {
    started_ms: u64,
    writes: AtomicU64,
    published: AtomicU64,
    lagged: AtomicU64,
    invalid_keys: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_ms: now_ms(),
            writes: AtomicU64::new(0),
            published: AtomicU64::new(0),
            lagged: AtomicU64::new(0),
            invalid_keys: AtomicU64::new(0),
        }
    }

    pub fn uptime_ms(&self) -> u64 {
        now_ms().saturating_sub(self.started_ms)
    }

    /// Counts SETs and DELs that changed a record.
    pub fn inc_writes(&self) {
        self.writes.fetch_add(1, Relaxed);
    }

    pub fn inc_published(&self) {
        self.published.fetch_add(1, Relaxed);
    }

    pub fn inc_lagged(&self) {
        self.lagged.fetch_add(1, Relaxed);
    }

    pub fn inc_invalid_key(&self) {
        self.invalid_keys.fetch_add(1, Relaxed);
    }

    pub fn snapshot(&self, records_count: u64, pubsub_topics: u64) -> StatsV1 {
        StatsV1 {
            uptime_ms: self.uptime_ms(),
            records_count,
            pubsub_topics,
            writes_total: self.writes.load(Relaxed),
            events_published_total: self.published.load(Relaxed),
            events_lagged_total: self.lagged.load(Relaxed),
            invalid_key_total: self.invalid_keys.load(Relaxed),
        }
    }
}
