use core::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the cache's event counters; see [`BufferCache::stats`](crate::BufferCache::stats).
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct CacheStats {
    /// Lookups answered from a bucket without touching the pool.
    pub hits: u64,
    /// Misses that found an idle slot still holding the block.
    pub revivals: u64,
    /// Blocks read from the disk.
    pub misses: u64,
    /// Blocks written to the disk.
    pub writes: u64,
    /// Idle slots handed to a different block.
    pub recycles: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    revivals: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    recycles: AtomicU64,
}

#[derive(Copy, Clone)]
pub(crate) enum Event {
    Hit,
    Revival,
    Miss,
    Write,
    Recycle,
}

impl Counters {
    pub(crate) const fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            revivals: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            recycles: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn count(&self, event: Event) {
        let counter = match event {
            Event::Hit => &self.hits,
            Event::Revival => &self.revivals,
            Event::Miss => &self.misses,
            Event::Write => &self.writes,
            Event::Recycle => &self.recycles,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            revivals: self.revivals.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            recycles: self.recycles.load(Ordering::Relaxed),
        }
    }
}
