//! Header-tracked heap allocator
//!
//! # Safety
//!
//! Each allocation reserves `size + HEADER_SIZE + alignment` bytes from the
//! backing store. The returned pointer is the first `alignment`-aligned
//! address at least `HEADER_SIZE` bytes into the block, and the header is
//! written directly in front of it.
//!
//! ## Invariants
//!
//! - `aligned - raw` is in `[HEADER_SIZE, HEADER_SIZE + alignment)`, so the
//!   header and the `size` data bytes both fit inside the block
//! - alignment is at least word size, so the header slot is word aligned
//! - `free` releases exactly `header.original`, the block the backing store
//!   handed out
//!
//! ## Thread Safety
//!
//! - `HeapAllocator` is `!Sync`; it can move between threads but not be
//!   shared
//! - `ConcurrentHeapAllocator` holds a mutex across the window from backing
//!   allocation to header write, and across every free

use core::cell::Cell;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use parking_lot::Mutex;

use super::HeapConfig;
use crate::capabilities::AllocatorCapabilities;
use crate::error::{MemoryError, MemoryResult};
use crate::header::{AllocationHeader, HEADER_SIZE};
use crate::platform::SystemHeap;
use crate::stats::{AllocatorStats, AtomicAllocatorStats, StatisticsProvider};
use crate::traits::{Allocator, MemoryUsage, RandomFree, Reallocate, ThreadSafeAllocator};
use crate::utils::{align_up, effective_alignment, is_valid_alignment};

/// Allocation logic shared by both heap variants
///
/// Performs no locking of its own.
#[derive(Debug)]
struct HeapCore {
    config: HeapConfig,
    stats: AtomicAllocatorStats,
}

impl HeapCore {
    fn new(config: HeapConfig) -> Self {
        Self {
            config,
            stats: AtomicAllocatorStats::default(),
        }
    }

    fn malloc(&self, size: usize, alignment: usize) -> MemoryResult<NonNull<u8>> {
        if !is_valid_alignment(alignment) {
            return Err(self.reject(MemoryError::invalid_alignment(alignment)));
        }
        if let Some(max_size) = self.config.max_allocation_size
            && size > max_size
        {
            return Err(self.reject(MemoryError::allocation_too_large(size, max_size)));
        }

        let alignment = effective_alignment(alignment);
        let total = size
            .checked_add(HEADER_SIZE)
            .and_then(|v| v.checked_add(alignment))
            .ok_or_else(|| self.reject(MemoryError::size_overflow("heap malloc")))?;

        let raw = SystemHeap::allocate(total);
        let raw_addr = raw.as_ptr() as usize;
        let offset = align_up(raw_addr + HEADER_SIZE, alignment) - raw_addr;
        debug_assert!(offset >= HEADER_SIZE && offset + size <= total);

        // SAFETY: offset < HEADER_SIZE + alignment <= total, so the result
        // stays inside the block and is non-null.
        let data = unsafe { NonNull::new_unchecked(raw.as_ptr().add(offset)) };

        // SAFETY: the HEADER_SIZE bytes in front of data are inside the block
        // and data is at least word aligned.
        unsafe { AllocationHeader::new(size, raw.as_ptr()).write_before(data) };

        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: data is valid for size bytes (checked above).
            unsafe { ptr::write_bytes(data.as_ptr(), pattern, size) };
        }

        if self.config.track_stats {
            self.stats.record_allocation(size);
        }
        trace_event!(size, alignment, ptr = ?data, "heap malloc");

        Ok(data)
    }

    /// # Safety
    ///
    /// A non-null `ptr` must come from `malloc` on this core and be live.
    unsafe fn free(&self, ptr: *mut u8) {
        let Some(data) = NonNull::new(ptr) else {
            return;
        };

        // SAFETY: caller guarantees data carries a header.
        let header = unsafe { AllocationHeader::read_before(data) };

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: data is still valid for header.data_size bytes.
            unsafe { ptr::write_bytes(data.as_ptr(), pattern, header.data_size) };
        }
        if self.config.track_stats {
            self.stats.record_deallocation(header.data_size);
        }
        trace_event!(size = header.data_size, ptr = ?data, "heap free");

        debug_assert!(
            !header.original.is_null(),
            "corrupt allocation header at {data:p}"
        );
        if let Some(original) = NonNull::new(header.original) {
            // SAFETY: original is the block returned by the backing store.
            unsafe { SystemHeap::free(original) };
        }
    }

    /// # Safety
    ///
    /// A non-null `ptr` must come from `malloc` on this core and be live.
    unsafe fn allocation_size(ptr: *const u8) -> Option<usize> {
        let data = NonNull::new(ptr.cast_mut())?;
        // SAFETY: caller guarantees data carries a header.
        Some(unsafe { AllocationHeader::read_before(data) }.data_size)
    }

    /// # Safety
    ///
    /// A non-null `ptr` must come from `malloc` on this core and be live.
    unsafe fn realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        alignment: usize,
    ) -> MemoryResult<NonNull<u8>> {
        let Some(old) = NonNull::new(ptr) else {
            return self.malloc(new_size, alignment);
        };

        // SAFETY: caller guarantees old carries a header.
        let old_size = unsafe { AllocationHeader::read_before(old) }.data_size;
        let new = self.malloc(new_size, alignment)?;

        // SAFETY: both blocks are live, distinct, and valid for the copied
        // length.
        unsafe {
            ptr::copy_nonoverlapping(old.as_ptr(), new.as_ptr(), old_size.min(new_size));
            self.free(old.as_ptr());
        }

        if self.config.track_stats {
            self.stats.record_reallocation();
        }
        Ok(new)
    }

    fn reject(&self, err: MemoryError) -> MemoryError {
        if self.config.track_stats {
            self.stats.record_failure();
        }
        err
    }
}

// ============================================================================
// Single-threaded variant
// ============================================================================

/// Default general-purpose allocator
///
/// Every pointer is preceded by an [`AllocationHeader`], so it can be freed
/// in any order and its requested size queried later.
#[derive(Debug)]
pub struct HeapAllocator {
    core: HeapCore,
    /// Not concurrent: `Cell` keeps the type `!Sync`
    _not_sync: PhantomData<Cell<()>>,
}

impl HeapAllocator {
    /// Creates a heap allocator with default configuration
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    pub fn with_config(config: HeapConfig) -> Self {
        Self {
            core: HeapCore::new(config),
            _not_sync: PhantomData,
        }
    }

    /// Creates a production-optimized heap allocator
    pub fn production() -> Self {
        Self::with_config(HeapConfig::production())
    }

    /// Creates a debug-optimized heap allocator
    pub fn debug() -> Self {
        Self::with_config(HeapConfig::debug())
    }

    pub fn config(&self) -> &HeapConfig {
        &self.core.config
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: HeapCore::malloc returns aligned, in-bounds, non-overlapping
// blocks; capabilities match the RandomFree/Reallocate impls below.
unsafe impl Allocator for HeapAllocator {
    const CAPABILITIES: AllocatorCapabilities = AllocatorCapabilities::GENERAL;

    #[inline]
    fn malloc(&self, size: usize, alignment: usize) -> MemoryResult<NonNull<u8>> {
        self.core.malloc(size, alignment)
    }

    #[inline]
    unsafe fn try_get_allocation_size(&self, ptr: *const u8) -> Option<usize> {
        // SAFETY: forwarded caller contract.
        unsafe { HeapCore::allocation_size(ptr) }
    }

    unsafe fn try_free(&self, ptr: *mut u8) -> MemoryResult<()> {
        // SAFETY: forwarded caller contract.
        unsafe { self.free(ptr) };
        Ok(())
    }

    unsafe fn try_realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        alignment: usize,
    ) -> MemoryResult<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        unsafe { self.realloc(ptr, new_size, alignment) }
    }

    fn name(&self) -> &'static str {
        "HeapAllocator"
    }
}

// SAFETY: every pointer carries a header naming its backing block.
unsafe impl RandomFree for HeapAllocator {
    #[inline]
    unsafe fn free(&self, ptr: *mut u8) {
        // SAFETY: forwarded caller contract.
        unsafe { self.core.free(ptr) }
    }
}
assert_capability!(HeapAllocator, can_random_free);

// SAFETY: realloc is malloc + copy + free on header-tracked blocks.
unsafe impl Reallocate for HeapAllocator {
    unsafe fn realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        alignment: usize,
    ) -> MemoryResult<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        unsafe { self.core.realloc(ptr, new_size, alignment) }
    }
}
assert_capability!(HeapAllocator, is_reallocation_allowed);

impl MemoryUsage for HeapAllocator {
    fn used_memory(&self) -> usize {
        self.core.stats.snapshot().allocated_bytes
    }

    fn available_memory(&self) -> Option<usize> {
        None
    }
}

impl StatisticsProvider for HeapAllocator {
    fn statistics(&self) -> AllocatorStats {
        self.core.stats.snapshot()
    }

    fn reset_statistics(&self) {
        self.core.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.core.config.track_stats
    }
}

// ============================================================================
// Concurrent variant
// ============================================================================

/// Heap allocator that may be shared across threads
///
/// Same layout and semantics as [`HeapAllocator`]. A mutex serializes the
/// allocate→header-write sequence and every free.
#[derive(Debug)]
pub struct ConcurrentHeapAllocator {
    core: HeapCore,
    lock: Mutex<()>,
}

impl ConcurrentHeapAllocator {
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    pub fn with_config(config: HeapConfig) -> Self {
        Self {
            core: HeapCore::new(config),
            lock: Mutex::new(()),
        }
    }

    pub fn production() -> Self {
        Self::with_config(HeapConfig::production())
    }

    pub fn debug() -> Self {
        Self::with_config(HeapConfig::debug())
    }

    pub fn config(&self) -> &HeapConfig {
        &self.core.config
    }
}

impl Default for ConcurrentHeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: same guarantees as HeapAllocator, with every mutation of backing
// memory performed under `lock`.
unsafe impl Allocator for ConcurrentHeapAllocator {
    const CAPABILITIES: AllocatorCapabilities = AllocatorCapabilities::GENERAL.concurrent();

    fn malloc(&self, size: usize, alignment: usize) -> MemoryResult<NonNull<u8>> {
        let _guard = self.lock.lock();
        self.core.malloc(size, alignment)
    }

    #[inline]
    unsafe fn try_get_allocation_size(&self, ptr: *const u8) -> Option<usize> {
        // SAFETY: forwarded caller contract; a live header is only written
        // once, before the pointer is published.
        unsafe { HeapCore::allocation_size(ptr) }
    }

    unsafe fn try_free(&self, ptr: *mut u8) -> MemoryResult<()> {
        // SAFETY: forwarded caller contract.
        unsafe { self.free(ptr) };
        Ok(())
    }

    unsafe fn try_realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        alignment: usize,
    ) -> MemoryResult<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        unsafe { self.realloc(ptr, new_size, alignment) }
    }

    fn name(&self) -> &'static str {
        "ConcurrentHeapAllocator"
    }
}

// SAFETY: see HeapAllocator; serialized by `lock`.
unsafe impl RandomFree for ConcurrentHeapAllocator {
    unsafe fn free(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        let _guard = self.lock.lock();
        // SAFETY: forwarded caller contract.
        unsafe { self.core.free(ptr) }
    }
}
assert_capability!(ConcurrentHeapAllocator, can_random_free);

// SAFETY: see HeapAllocator; the whole malloc/copy/free runs under `lock`.
unsafe impl Reallocate for ConcurrentHeapAllocator {
    unsafe fn realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        alignment: usize,
    ) -> MemoryResult<NonNull<u8>> {
        let _guard = self.lock.lock();
        // SAFETY: forwarded caller contract.
        unsafe { self.core.realloc(ptr, new_size, alignment) }
    }
}
assert_capability!(ConcurrentHeapAllocator, is_reallocation_allowed);

// SAFETY: all backing-store mutation is serialized by the mutex.
unsafe impl ThreadSafeAllocator for ConcurrentHeapAllocator {}
assert_capability!(ConcurrentHeapAllocator, is_concurrent);

impl MemoryUsage for ConcurrentHeapAllocator {
    fn used_memory(&self) -> usize {
        self.core.stats.snapshot().allocated_bytes
    }

    fn available_memory(&self) -> Option<usize> {
        None
    }
}

impl StatisticsProvider for ConcurrentHeapAllocator {
    fn statistics(&self) -> AllocatorStats {
        self.core.stats.snapshot()
    }

    fn reset_statistics(&self) {
        self.core.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.core.config.track_stats
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::utils::WORD_ALIGNMENT;

    #[rstest]
    #[case(1, 1)]
    #[case(1, 0)]
    #[case(7, 4)]
    #[case(64, 16)]
    #[case(100, 64)]
    #[case(4096, 4096)]
    fn malloc_respects_alignment_and_records_size(#[case] size: usize, #[case] align: usize) {
        let heap = HeapAllocator::debug();
        let ptr = heap.malloc(size, align).expect("allocation failed");
        let addr = ptr.as_ptr() as usize;
        assert_eq!(addr % align.max(WORD_ALIGNMENT), 0);
        // SAFETY: ptr is live and from heap.
        unsafe {
            assert_eq!(heap.try_get_allocation_size(ptr.as_ptr()), Some(size));
            heap.free(ptr.as_ptr());
        }
    }

    #[test]
    fn header_sits_directly_before_data() {
        let heap = HeapAllocator::production();
        let ptr = heap.malloc(24, 32).expect("allocation failed");
        // SAFETY: ptr is live and from heap.
        unsafe {
            let header = AllocationHeader::read_before(ptr);
            assert_eq!(header.data_size, 24);
            let distance = ptr.as_ptr() as usize - header.original as usize;
            assert!(distance >= HEADER_SIZE);
            assert!(distance < HEADER_SIZE + 32);
            heap.free(ptr.as_ptr());
        }
    }

    #[test]
    fn null_is_harmless() {
        let heap = HeapAllocator::new();
        // SAFETY: null is explicitly allowed.
        unsafe {
            heap.free(ptr::null_mut());
            assert_eq!(heap.try_get_allocation_size(ptr::null()), None);
            assert!(heap.try_free(ptr::null_mut()).is_ok());
        }
    }

    #[test]
    fn non_power_of_two_alignment_is_rejected() {
        let heap = HeapAllocator::debug();
        let err = heap.malloc(16, 24).unwrap_err();
        assert_eq!(err, MemoryError::InvalidAlignment { alignment: 24 });
        assert_eq!(heap.statistics().failed_allocations, 1);
    }

    #[test]
    fn size_overflow_is_rejected() {
        let heap = HeapAllocator::production();
        let err = heap.malloc(usize::MAX - 4, 8).unwrap_err();
        assert!(matches!(err, MemoryError::SizeOverflow { .. }));
    }

    #[test]
    fn max_allocation_size_is_enforced() {
        let heap = HeapAllocator::with_config(HeapConfig {
            max_allocation_size: Some(128),
            ..HeapConfig::production()
        });
        assert!(matches!(
            heap.malloc(129, 8),
            Err(MemoryError::ExceedsMaxSize { size: 129, max_size: 128 })
        ));
        let ptr = heap.malloc(128, 8).expect("allocation failed");
        // SAFETY: ptr is live.
        unsafe { heap.free(ptr.as_ptr()) };
    }

    #[test]
    fn fill_pattern_applied_to_fresh_memory() {
        let heap = HeapAllocator::debug();
        let ptr = heap.malloc(32, 8).expect("allocation failed");
        // SAFETY: ptr is valid for 32 bytes.
        unsafe {
            let bytes = core::slice::from_raw_parts(ptr.as_ptr(), 32);
            assert!(bytes.iter().all(|&b| b == 0xCC));
            heap.free(ptr.as_ptr());
        }
    }

    #[test]
    fn realloc_preserves_prefix() {
        let heap = HeapAllocator::debug();
        let ptr = heap.malloc(8, 8).expect("allocation failed");
        // SAFETY: pointers are live and used within their sizes.
        unsafe {
            for i in 0..8u8 {
                ptr.as_ptr().add(i as usize).write(i);
            }
            let grown = heap.realloc(ptr.as_ptr(), 64, 16).expect("realloc failed");
            assert_eq!(grown.as_ptr() as usize % 16, 0);
            assert_eq!(heap.try_get_allocation_size(grown.as_ptr()), Some(64));
            for i in 0..8u8 {
                assert_eq!(*grown.as_ptr().add(i as usize), i);
            }

            let shrunk = heap.realloc(grown.as_ptr(), 4, 0).expect("realloc failed");
            assert_eq!(heap.try_get_allocation_size(shrunk.as_ptr()), Some(4));
            assert_eq!(*shrunk.as_ptr().add(3), 3);
            heap.free(shrunk.as_ptr());
        }

        let stats = heap.statistics();
        assert_eq!(stats.reallocation_count, 2);
        assert_eq!(stats.allocated_bytes, 0);
        assert_eq!(stats.live_allocations(), 0);
    }

    #[test]
    fn realloc_null_is_malloc() {
        let heap = HeapAllocator::new();
        // SAFETY: null is allowed; result is freed once.
        unsafe {
            let ptr = heap.realloc(ptr::null_mut(), 10, 0).expect("realloc failed");
            assert_eq!(heap.try_get_allocation_size(ptr.as_ptr()), Some(10));
            heap.free(ptr.as_ptr());
        }
    }

    #[test]
    fn stats_track_live_bytes() {
        let heap = HeapAllocator::debug();
        let a = heap.malloc(100, 0).expect("allocation failed");
        let b = heap.malloc(50, 0).expect("allocation failed");
        assert_eq!(heap.used_memory(), 150);
        // SAFETY: a and b are live.
        unsafe {
            heap.free(a.as_ptr());
            assert_eq!(heap.used_memory(), 50);
            heap.free(b.as_ptr());
        }
        let stats = heap.statistics();
        assert_eq!(stats.peak_allocated_bytes, 150);
        assert_eq!(stats.allocation_count, 2);
        assert_eq!(stats.deallocation_count, 2);
        assert_eq!(heap.total_memory(), None);
    }

    #[test]
    fn capabilities() {
        assert_eq!(HeapAllocator::CAPABILITIES, AllocatorCapabilities::GENERAL);
        assert!(ConcurrentHeapAllocator::CAPABILITIES.is_concurrent);
        assert!(ConcurrentHeapAllocator::new().capabilities().can_random_free);
    }

    #[test]
    fn concurrent_heap_across_threads() {
        let heap = Arc::new(ConcurrentHeapAllocator::debug());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let heap = Arc::clone(&heap);
                thread::spawn(move || {
                    for i in 1..=200usize {
                        let size = i * (t + 1);
                        let ptr = heap.malloc(size, 16).expect("allocation failed");
                        // SAFETY: ptr is live and valid for size bytes.
                        unsafe {
                            ptr::write_bytes(ptr.as_ptr(), t as u8, size);
                            assert_eq!(heap.try_get_allocation_size(ptr.as_ptr()), Some(size));
                            heap.free(ptr.as_ptr());
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }
        let stats = heap.statistics();
        assert_eq!(stats.allocation_count, 800);
        assert_eq!(stats.deallocation_count, 800);
        assert_eq!(stats.allocated_bytes, 0);
    }
}
