use std::sync::atomic::{AtomicU64, Ordering};

use super::command::Metric;

/// Webhook hit/miss counters, shared between the dispatch loop and the
/// heartbeat thread.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Metric {
        Metric {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
