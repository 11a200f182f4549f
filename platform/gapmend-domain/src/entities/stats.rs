use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate counters returned to the caller at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MissingProcessingStats {
    pub fills: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// Live counters shared across fill workers. Increments are atomic so the
/// column fanout never loses updates; the snapshot is taken after all
/// workers have joined.
#[derive(Debug, Default)]
pub struct StatsCollector {
    fills: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fill(&self) {
        self.fills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MissingProcessingStats {
        MissingProcessingStats {
            fills: self.fills.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StatsCollector;

    #[test]
    fn snapshot_reflects_recorded_counts() {
        let stats = StatsCollector::new();
        stats.record_fill();
        stats.record_fill();
        stats.record_cache_hit();
        stats.record_cache_miss();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.fills, 2);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 1);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let stats = StatsCollector::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        stats.record_fill();
                    }
                });
            }
        });
        assert_eq!(stats.snapshot().fills, 4000);
    }
}
