//! Allocator statistics tracking
//!
//! Counters are only updated when an allocator's config has `track_stats`
//! set; the snapshot type is always available.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::utils::atomic_max;

/// Statistics snapshot for an allocator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Bytes currently handed out to callers
    pub allocated_bytes: usize,
    /// Highest value `allocated_bytes` has reached
    pub peak_allocated_bytes: usize,
    /// Successful allocations
    pub allocation_count: usize,
    /// Successful frees
    pub deallocation_count: usize,
    /// Successful reallocations
    pub reallocation_count: usize,
    /// Allocations rejected with a recoverable error
    pub failed_allocations: usize,
    /// Bulk resets (arena only)
    pub reset_count: usize,
}

impl AllocatorStats {
    /// Number of allocations not yet freed
    pub fn live_allocations(&self) -> usize {
        self.allocation_count.saturating_sub(self.deallocation_count)
    }

    /// Fraction of allocation attempts that succeeded (0.0 to 1.0)
    pub fn allocation_efficiency(&self) -> f64 {
        let attempts = self.allocation_count + self.failed_allocations;
        if attempts == 0 {
            1.0
        } else {
            self.allocation_count as f64 / attempts as f64
        }
    }
}

impl fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Allocator Statistics:")?;
        writeln!(f, "  Current allocated: {} bytes", self.allocated_bytes)?;
        writeln!(f, "  Peak allocated: {} bytes", self.peak_allocated_bytes)?;
        writeln!(f, "  Allocations: {}", self.allocation_count)?;
        writeln!(f, "  Deallocations: {}", self.deallocation_count)?;
        writeln!(f, "  Reallocations: {}", self.reallocation_count)?;
        writeln!(f, "  Failed allocations: {}", self.failed_allocations)?;
        write!(f, "  Resets: {}", self.reset_count)
    }
}

/// Thread-safe counters backing [`AllocatorStats`]
#[derive(Debug, Default)]
pub(crate) struct AtomicAllocatorStats {
    allocated_bytes: AtomicUsize,
    peak_allocated_bytes: AtomicUsize,
    allocation_count: AtomicUsize,
    deallocation_count: AtomicUsize,
    reallocation_count: AtomicUsize,
    failed_allocations: AtomicUsize,
    reset_count: AtomicUsize,
}

impl AtomicAllocatorStats {
    pub(crate) fn record_allocation(&self, size: usize) {
        self.allocation_count.fetch_add(1, Ordering::Relaxed);
        let now = self
            .allocated_bytes
            .fetch_add(size, Ordering::Relaxed)
            .saturating_add(size);
        atomic_max(&self.peak_allocated_bytes, now);
    }

    pub(crate) fn record_deallocation(&self, size: usize) {
        self.deallocation_count.fetch_add(1, Ordering::Relaxed);
        self.allocated_bytes.fetch_sub(size, Ordering::Relaxed);
    }

    pub(crate) fn record_reallocation(&self) {
        self.reallocation_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed_allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Arena reset: everything handed out is released at once
    pub(crate) fn record_reset(&self) {
        self.reset_count.fetch_add(1, Ordering::Relaxed);
        self.allocated_bytes.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> AllocatorStats {
        AllocatorStats {
            allocated_bytes: self.allocated_bytes.load(Ordering::Relaxed),
            peak_allocated_bytes: self.peak_allocated_bytes.load(Ordering::Relaxed),
            allocation_count: self.allocation_count.load(Ordering::Relaxed),
            deallocation_count: self.deallocation_count.load(Ordering::Relaxed),
            reallocation_count: self.reallocation_count.load(Ordering::Relaxed),
            failed_allocations: self.failed_allocations.load(Ordering::Relaxed),
            reset_count: self.reset_count.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.allocated_bytes,
            &self.peak_allocated_bytes,
            &self.allocation_count,
            &self.deallocation_count,
            &self.reallocation_count,
            &self.failed_allocations,
            &self.reset_count,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Allocators that expose statistics
pub trait StatisticsProvider {
    /// Current statistics snapshot
    fn statistics(&self) -> AllocatorStats;

    /// Zero every counter
    fn reset_statistics(&self);

    /// Whether counters are being updated
    fn statistics_enabled(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn allocation_and_free_balance() {
        let stats = AtomicAllocatorStats::default();
        stats.record_allocation(100);
        stats.record_allocation(50);
        stats.record_deallocation(100);

        let snap = stats.snapshot();
        assert_eq!(snap.allocated_bytes, 50);
        assert_eq!(snap.peak_allocated_bytes, 150);
        assert_eq!(snap.live_allocations(), 1);
    }

    #[test]
    fn reset_keeps_peak_until_statistics_reset() {
        let stats = AtomicAllocatorStats::default();
        stats.record_allocation(64);
        stats.record_reset();
        let snap = stats.snapshot();
        assert_eq!(snap.allocated_bytes, 0);
        assert_eq!(snap.peak_allocated_bytes, 64);
        assert_eq!(snap.reset_count, 1);

        stats.reset();
        assert_eq!(stats.snapshot(), AllocatorStats::default());
    }

    #[test]
    fn efficiency() {
        let snap = AllocatorStats {
            allocation_count: 3,
            failed_allocations: 1,
            ..AllocatorStats::default()
        };
        assert!((snap.allocation_efficiency() - 0.75).abs() < f64::EPSILON);
        assert!((AllocatorStats::default().allocation_efficiency() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn display_lists_counters() {
        let text = AllocatorStats::default().to_string();
        assert!(text.contains("Allocations: 0"));
        assert!(text.contains("Resets: 0"));
    }
}
