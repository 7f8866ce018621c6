//! Allocator traits
//!
//! The capability descriptor is enforced by splitting operations across
//! traits: every allocator implements [`Allocator`], but only allocators
//! that can free individual pointers implement [`RandomFree`], and only those
//! that can resize implement [`Reallocate`]. Calling `free` on an arena is a
//! compile error; through a type-erased handle it is an `Err`.

use core::ptr::NonNull;

use crate::capabilities::AllocatorCapabilities;
use crate::error::{MemoryError, MemoryResult};
use crate::utils::DEFAULT_ALIGNMENT;

/// Core allocator contract
///
/// # Safety
///
/// Implementors must guarantee that:
/// - a pointer returned by `malloc(size, alignment)` is aligned to
///   `alignment`, or to word alignment when `alignment` is `0`, and valid
///   for `size` bytes of reads and writes;
/// - live allocations never overlap;
/// - `CAPABILITIES` truthfully describes the implementation.
pub unsafe trait Allocator {
    /// Static capability descriptor for this allocator type
    const CAPABILITIES: AllocatorCapabilities;

    /// Allocates `size` bytes aligned to `alignment`
    ///
    /// `alignment` must be `0` (natural) or a power of two.
    fn malloc(&self, size: usize, alignment: usize) -> MemoryResult<NonNull<u8>>;

    /// Allocates `size` bytes with natural word alignment
    #[inline]
    fn malloc_default(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        self.malloc(size, DEFAULT_ALIGNMENT)
    }

    /// Returns the size originally requested for `ptr`
    ///
    /// `None` for null, and for allocators that keep no per-allocation
    /// metadata.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be a live allocation from this allocator.
    unsafe fn try_get_allocation_size(&self, ptr: *const u8) -> Option<usize>;

    /// Frees `ptr` if this allocator supports individual frees
    ///
    /// The default rejects the call with [`MemoryError::NotSupported`].
    ///
    /// # Safety
    ///
    /// Same as [`RandomFree::free`].
    unsafe fn try_free(&self, ptr: *mut u8) -> MemoryResult<()> {
        let _ = ptr;
        Err(MemoryError::not_supported("free", self.name()))
    }

    /// Resizes `ptr` if this allocator supports reallocation
    ///
    /// The default rejects the call with [`MemoryError::NotSupported`].
    ///
    /// # Safety
    ///
    /// Same as [`Reallocate::realloc`].
    unsafe fn try_realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        alignment: usize,
    ) -> MemoryResult<NonNull<u8>> {
        let _ = (ptr, new_size, alignment);
        Err(MemoryError::not_supported("realloc", self.name()))
    }

    /// Releases every allocation at once if this allocator supports it
    ///
    /// The default rejects the call with [`MemoryError::NotSupported`];
    /// arenas forward to [`Resettable::reset`].
    fn try_reset(&mut self) -> MemoryResult<()> {
        Err(MemoryError::not_supported("reset", self.name()))
    }

    /// Allocator name for diagnostics
    fn name(&self) -> &'static str;

    /// Runtime copy of [`Allocator::CAPABILITIES`]
    #[inline]
    fn capabilities(&self) -> AllocatorCapabilities {
        Self::CAPABILITIES
    }
}

/// Allocators that can free individual pointers in any order
///
/// # Safety
///
/// Only implement for types whose `CAPABILITIES.can_random_free` is true.
/// Pair every impl with `assert_capability!(Type, can_random_free)`.
pub unsafe trait RandomFree: Allocator {
    /// Releases `ptr`; null is a no-op
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must come from this allocator's `malloc` and must not
    /// have been freed already.
    unsafe fn free(&self, ptr: *mut u8);
}

/// Allocators that can resize live allocations
///
/// # Safety
///
/// Only implement for types whose `CAPABILITIES.is_reallocation_allowed` is
/// true.
pub unsafe trait Reallocate: RandomFree {
    /// Resizes `ptr` to `new_size` bytes, preserving the common prefix
    ///
    /// Null `ptr` behaves like `malloc`. On success the old pointer is
    /// released; on error it stays valid.
    ///
    /// # Safety
    ///
    /// Same as [`RandomFree::free`].
    unsafe fn realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        alignment: usize,
    ) -> MemoryResult<NonNull<u8>>;
}

/// Marker for allocators that are safe to share across threads
///
/// # Safety
///
/// Only implement for types whose `CAPABILITIES.is_concurrent` is true and
/// whose `malloc`/`free` are correctly synchronized.
pub unsafe trait ThreadSafeAllocator: Allocator + Send + Sync {}

/// Allocators that release everything at once
pub trait Resettable {
    /// Invalidates every allocation and makes the full capacity available
    ///
    /// Takes `&mut self`, so references handed out by typed helpers cannot
    /// outlive the reset. Raw pointers from `malloc` are the caller's
    /// responsibility.
    fn reset(&mut self);
}

/// Memory usage tracking
pub trait MemoryUsage {
    /// Currently used memory in bytes
    fn used_memory(&self) -> usize;

    /// Available memory in bytes, if bounded
    fn available_memory(&self) -> Option<usize>;

    /// Total capacity in bytes, if bounded
    fn total_memory(&self) -> Option<usize> {
        self.available_memory()
            .map(|available| self.used_memory() + available)
    }

    /// Usage as a percentage (0.0 to 100.0)
    fn memory_usage_percent(&self) -> Option<f32> {
        self.total_memory().map(|total| {
            if total == 0 {
                0.0
            } else {
                (self.used_memory() as f32 / total as f32) * 100.0
            }
        })
    }
}
