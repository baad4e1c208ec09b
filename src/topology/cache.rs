//! Cache invalidation utilities shared by the adjacency side tables.

use std::fmt;

/// Anything that caches derived topology (coboundaries, neighbours, …)
/// should implement this.
pub trait InvalidateCache {
    /// Invalidate *all* internal caches so future queries recompute correctly.
    fn invalidate_cache(&mut self);
}

// Blanket impl for Box<T>
impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}

/// Version number of one physical collection.
///
/// Advanced once per successful physical insertion and once per erase pass;
/// cache entries stamped with an older value are stale.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeCounter(u64);

impl ChangeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Advances the counter and returns the new value.
    #[inline]
    pub fn bump(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

impl fmt::Debug for ChangeCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeCounter({})", self.0)
    }
}

/// Cached list stamped with the counter value it was computed at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheEntry<T> {
    pub stamp: u64,
    pub list: Vec<T>,
}

impl<T> CacheEntry<T> {
    #[inline]
    pub fn is_obsolete(&self, current: u64) -> bool {
        self.stamp != current
    }
}

/// Lifecycle of one cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    Uninitialized,
    Valid(u64),
    Stale(u64),
}

/// Hit/miss counters of one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Misses that replaced an obsolete entry.
    pub recomputed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        invalidations: usize,
    }

    impl InvalidateCache for Counter {
        fn invalidate_cache(&mut self) {
            self.invalidations += 1;
        }
    }

    #[test]
    fn boxed_forwarding() {
        let mut boxed: Box<Counter> = Box::default();
        boxed.invalidate_cache();
        boxed.invalidate_cache();
        assert_eq!(boxed.invalidations, 2);
    }

    #[test]
    fn stamps_go_obsolete() {
        let mut counter = ChangeCounter::new();
        let entry = CacheEntry {
            stamp: counter.get(),
            list: vec![1, 2],
        };
        assert!(!entry.is_obsolete(counter.get()));
        assert_eq!(counter.bump(), 1);
        assert!(entry.is_obsolete(counter.get()));
    }
}
