//! Cache statistics
//!
//! Hit/miss counters live in the backing store (atomic increments) rather
//! than in process memory, so several rendering workers sharing one cache
//! report one consistent set of numbers.

use serde::Serialize;

/// Counter name for cache hits
pub(crate) const HITS: &str = "hits";
/// Counter name for cache misses
pub(crate) const MISSES: &str = "misses";

/// Point-in-time cache statistics
///
/// Entry count and total size come from a key scan and may be approximate
/// under concurrent mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatistics {
    /// Lookups that returned a live entry
    pub hits: u64,
    /// Lookups that found nothing (or only an expired entry)
    pub misses: u64,
    /// `hits / (hits + misses)`, `0.0` before any lookup
    pub hit_rate: f64,
    /// Number of live cache entries
    pub entry_count: usize,
    /// Approximate bytes of stored entry records
    pub total_size_bytes: u64,
}

/// Derive the hit rate from raw counters
#[must_use]
pub(crate) fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        return 0.0;
    }
    hits as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_arithmetic() {
        assert!((hit_rate(2, 1) - 2.0 / 3.0).abs() < f64::EPSILON);
        assert!((hit_rate(1, 0) - 1.0).abs() < f64::EPSILON);
        assert!((hit_rate(0, 5)).abs() < f64::EPSILON);
    }

    #[test]
    fn hit_rate_defined_without_lookups() {
        assert!((hit_rate(0, 0)).abs() < f64::EPSILON);
    }
}
