//! Bump-pointer arena over one reserved block
//!
//! # Safety
//!
//! - The block is reserved from the backing store in the constructor and
//!   returned in `Drop`; it never moves or grows
//! - The cursor is a byte offset in `[0, capacity]`. It only advances on
//!   allocation and only returns to 0 on `reset(&mut self)`
//! - A successful CAS on the cursor gives the caller exclusive ownership of
//!   `[aligned, aligned + size)`
//! - A failed allocation never moves the cursor
//!
//! ## Memory Layout
//! ```text
//! [base]----[alloc1]-pad-[alloc2]----[base + cursor]--------[base + capacity]
//!            <------- allocated ------->             <--- available --->
//! ```
//!
//! ## Memory Ordering
//!
//! - Acquire: loading the cursor
//! - `AcqRel`: CAS success
//! - Release: reset store
//! - Relaxed: statistics

use core::fmt;
use core::ptr::{self, NonNull};
use core::sync::atomic::Ordering;

#[cfg(feature = "logging")]
use tracing::debug;

use super::{AtomicCursor, CellCursor, Cursor, StackConfig};
use crate::capabilities::AllocatorCapabilities;
use crate::error::{MemoryError, MemoryResult};
use crate::platform::{RawBlock, SystemHeap};
use crate::stats::{AllocatorStats, AtomicAllocatorStats, StatisticsProvider};
use crate::traits::{Allocator, MemoryUsage, Resettable, ThreadSafeAllocator};
use crate::utils::{checked_align_up, is_valid_alignment, resolve_alignment};

/// Arena allocator with O(1) bump allocation and bulk-only release
///
/// Individual pointers cannot be freed: the type does not implement
/// [`RandomFree`](crate::traits::RandomFree). Call [`Resettable::reset`] to
/// release everything at once.
///
/// The default cursor is single-threaded; see [`ConcurrentStackAllocator`]
/// for a shareable variant.
pub struct StackAllocator<C: Cursor = CellCursor> {
    block: RawBlock,
    cursor: C,
    config: StackConfig,
    stats: AtomicAllocatorStats,
}

/// Stack allocator whose cursor advances with an atomic CAS
pub type ConcurrentStackAllocator = StackAllocator<AtomicCursor>;

impl<C: Cursor> StackAllocator<C> {
    /// Reserves `capacity` bytes from the backing store
    pub fn with_config(capacity: usize, config: StackConfig) -> MemoryResult<Self> {
        if capacity == 0 {
            return Err(MemoryError::invalid_config("stack capacity cannot be zero"));
        }
        if capacity > isize::MAX as usize {
            return Err(MemoryError::invalid_config(
                "stack capacity cannot exceed isize::MAX",
            ));
        }

        let block = SystemHeap::allocate_block(capacity);

        #[cfg(feature = "logging")]
        debug!(capacity, concurrent = C::CONCURRENT, "stack allocator reserved");

        Ok(Self {
            block,
            cursor: C::new(0),
            config,
            stats: AtomicAllocatorStats::default(),
        })
    }

    /// Creates a stack allocator with default configuration
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::default())
    }

    /// Creates a production-optimized stack allocator
    pub fn production(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::production())
    }

    /// Creates a debug-optimized stack allocator
    pub fn debug(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::debug())
    }

    /// Creates a performance-optimized stack allocator
    pub fn performance(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::performance())
    }

    /// Convenience constructors
    pub fn small() -> MemoryResult<Self> {
        Self::new(32 * 1024)
    } // 32KB
    pub fn medium() -> MemoryResult<Self> {
        Self::new(512 * 1024)
    } // 512KB
    pub fn large() -> MemoryResult<Self> {
        Self::new(8 * 1024 * 1024)
    } // 8MB

    /// Returns the total capacity of the arena
    pub fn capacity(&self) -> usize {
        self.block.size
    }

    /// Returns the number of bytes consumed, including alignment padding
    pub fn used(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Returns the number of bytes still available
    pub fn available(&self) -> usize {
        self.capacity().saturating_sub(self.used())
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Returns true if `ptr` points into the arena block
    pub fn contains(&self, ptr: *const u8) -> bool {
        let base = self.block.ptr.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= base && addr < base + self.capacity()
    }

    /// Moves `value` into the arena
    ///
    /// The value is never dropped. The reference is tied to `&self`, so it
    /// cannot outlive the next [`Resettable::reset`].
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_value<T>(&self, value: T) -> MemoryResult<&mut T> {
        let ptr = self.bump(size_of::<T>(), align_of::<T>())?.cast::<T>();
        // SAFETY: the region is exclusively ours, aligned for T and large
        // enough to hold it.
        unsafe {
            ptr.as_ptr().write(value);
            Ok(&mut *ptr.as_ptr())
        }
    }

    /// Copies `src` into the arena
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> MemoryResult<&mut [T]> {
        let size = size_of_val(src);
        let ptr = self.bump(size, align_of::<T>())?.cast::<T>();
        // SAFETY: the region is exclusively ours, aligned for T and holds
        // src.len() elements; src cannot overlap fresh arena memory.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), ptr.as_ptr(), src.len());
            Ok(core::slice::from_raw_parts_mut(ptr.as_ptr(), src.len()))
        }
    }

    /// Advances the cursor past an aligned region of `size` bytes
    ///
    /// `0` means natural word alignment; `1` packs bytes tightly.
    fn bump(&self, size: usize, alignment: usize) -> MemoryResult<NonNull<u8>> {
        if !is_valid_alignment(alignment) {
            return Err(self.reject(MemoryError::invalid_alignment(alignment)));
        }
        let alignment = resolve_alignment(alignment);

        let base = self.block.ptr.as_ptr() as usize;
        let capacity = self.capacity();
        let mut current = self.cursor.load(Ordering::Acquire);

        loop {
            let new_cursor = checked_align_up(base + current, alignment)
                .and_then(|aligned| aligned.checked_add(size))
                .map(|end| end - base)
                .filter(|&end| end <= capacity);

            let Some(new_cursor) = new_cursor else {
                return Err(self.reject(MemoryError::arena_exhausted(
                    size,
                    capacity - current,
                    capacity,
                )));
            };

            match self.cursor.compare_exchange_weak(
                current,
                new_cursor,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let offset = new_cursor - size;
                    // SAFETY: offset + size <= capacity, so the pointer is
                    // inside the block or one past its end for size 0.
                    let ptr = unsafe { NonNull::new_unchecked(self.block.ptr.as_ptr().add(offset)) };

                    if let Some(pattern) = self.config.alloc_pattern {
                        // SAFETY: the CAS gave us exclusive ownership of
                        // [ptr, ptr + size).
                        unsafe { ptr::write_bytes(ptr.as_ptr(), pattern, size) };
                    }
                    if self.config.track_stats {
                        self.stats.record_allocation(size);
                    }
                    trace_event!(size, alignment, offset, "stack malloc");

                    return Ok(ptr);
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn reject(&self, err: MemoryError) -> MemoryError {
        if self.config.track_stats {
            self.stats.record_failure();
        }
        err
    }
}

impl StackAllocator<CellCursor> {
    /// Creates a single-threaded arena with default configuration
    ///
    /// Same as [`StackAllocator::new`] but pins the cursor type, which is
    /// what most call sites want.
    pub fn local(capacity: usize) -> MemoryResult<Self> {
        Self::new(capacity)
    }
}

impl ConcurrentStackAllocator {
    /// Creates a shareable arena with default configuration
    pub fn shared(capacity: usize) -> MemoryResult<Self> {
        Self::new(capacity)
    }
}

// SAFETY: bump hands out aligned, in-bounds, non-overlapping regions; the
// descriptor reports no random free and no reallocation.
unsafe impl<C: Cursor> Allocator for StackAllocator<C> {
    const CAPABILITIES: AllocatorCapabilities =
        AllocatorCapabilities::ARENA.with_concurrency(C::CONCURRENT);

    #[inline]
    fn malloc(&self, size: usize, alignment: usize) -> MemoryResult<NonNull<u8>> {
        self.bump(size, alignment)
    }

    /// Arenas keep no per-allocation header, so sizes are never known
    unsafe fn try_get_allocation_size(&self, _ptr: *const u8) -> Option<usize> {
        None
    }

    fn try_reset(&mut self) -> MemoryResult<()> {
        Resettable::reset(self);
        Ok(())
    }

    fn name(&self) -> &'static str {
        if C::CONCURRENT {
            "ConcurrentStackAllocator"
        } else {
            "StackAllocator"
        }
    }
}

// SAFETY: the cursor is atomic and every region is claimed by CAS.
unsafe impl ThreadSafeAllocator for ConcurrentStackAllocator {}
assert_capability!(ConcurrentStackAllocator, is_concurrent);

impl<C: Cursor> Resettable for StackAllocator<C> {
    fn reset(&mut self) {
        let used = self.used();
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: &mut self proves no typed reference is alive, and
            // [base, base + used) is inside the block.
            unsafe { ptr::write_bytes(self.block.ptr.as_ptr(), pattern, used) };
        }
        self.cursor.store(0, Ordering::Release);

        if self.config.track_stats {
            self.stats.record_reset();
        }

        #[cfg(feature = "logging")]
        debug!(released = used, "stack allocator reset");
    }
}

impl<C: Cursor> MemoryUsage for StackAllocator<C> {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }

    fn total_memory(&self) -> Option<usize> {
        Some(self.capacity())
    }
}

impl<C: Cursor> StatisticsProvider for StackAllocator<C> {
    fn statistics(&self) -> AllocatorStats {
        let mut stats = self.stats.snapshot();
        if !self.config.track_stats {
            stats.allocated_bytes = self.used();
            stats.peak_allocated_bytes = self.used();
        }
        stats
    }

    fn reset_statistics(&self) {
        self.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.config.track_stats
    }
}

impl<C: Cursor> fmt::Debug for StackAllocator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.name())
            .field("base", &self.block.ptr)
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .field("config", &self.config)
            .finish()
    }
}

impl<C: Cursor> Drop for StackAllocator<C> {
    fn drop(&mut self) {
        // SAFETY: the block came from SystemHeap::allocate in with_config
        // and is released exactly once here.
        unsafe { SystemHeap::free(self.block.ptr) };
    }
}

// SAFETY: StackAllocator owns its block exclusively; moving it to another
// thread moves that ownership. The cursor decides whether sharing is sound.
unsafe impl<C: Cursor + Send> Send for StackAllocator<C> {}

// SAFETY: with a Sync cursor every region is claimed by CAS, so concurrent
// `&self` access never hands out overlapping memory. CellCursor is !Sync.
unsafe impl<C: Cursor + Sync> Sync for StackAllocator<C> {}
