//! Cache activity counters.
//!
//! Counters are tracked with relaxed atomics so the read path and the
//! control thread can update them without coordination; [`CacheMetrics`]
//! is the point-in-time snapshot handed to callers. All fields are
//! cumulative since cache construction.
//!
//! ## Key Components
//! - [`CacheCounters`]: atomic counters updated by lookups and the driver.
//! - [`CacheMetrics`]: plain snapshot returned by
//!   [`GenCache::metrics`](crate::cache::GenCache::metrics).

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic cache activity counters.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    negative_hits: AtomicU64,
    misses: AtomicU64,
    resolves: AtomicU64,
    installs: AtomicU64,
    removes: AtomicU64,
    rotations: AtomicU64,
}

impl CacheCounters {
    /// Returns a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            resolves: self.resolves.load(Ordering::Relaxed),
            installs: self.installs.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_negative_hit(&self) {
        self.negative_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_misses(&self, count: u64) {
        self.misses.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_resolve(&self) {
        self.resolves.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_installs(&self, count: u64) {
        self.installs.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of cache-level metrics.
///
/// # Example
///
/// ```
/// use gencache::metrics::CacheMetrics;
///
/// let metrics = CacheMetrics {
///     hits: 150,
///     negative_hits: 30,
///     misses: 20,
///     ..Default::default()
/// };
/// let looked_up = metrics.hits + metrics.negative_hits + metrics.misses;
/// assert_eq!(looked_up, 200);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Lookups answered by a present entry.
    pub hits: u64,
    /// Lookups answered by a negative entry (resolver-confirmed absence).
    pub negative_hits: u64,
    /// Keys that had to be sent to the resolver.
    pub misses: u64,
    /// Resolver invocations (one per residual miss batch).
    pub resolves: u64,
    /// Entries installed into the newest bucket.
    pub installs: u64,
    /// Explicit deletions that removed at least one entry.
    pub removes: u64,
    /// Ring rotations performed by the expiry driver.
    pub rotations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_zeroed() {
        let counters = CacheCounters::default();
        assert_eq!(counters.snapshot(), CacheMetrics::default());
    }

    #[test]
    fn counters_accumulate() {
        let counters = CacheCounters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_negative_hit();
        counters.record_misses(3);
        counters.record_resolve();
        counters.record_installs(4);
        counters.record_remove();
        counters.record_rotation();

        let metrics = counters.snapshot();
        assert_eq!(metrics.hits, 2);
        assert_eq!(metrics.negative_hits, 1);
        assert_eq!(metrics.misses, 3);
        assert_eq!(metrics.resolves, 1);
        assert_eq!(metrics.installs, 4);
        assert_eq!(metrics.removes, 1);
        assert_eq!(metrics.rotations, 1);
    }
}
