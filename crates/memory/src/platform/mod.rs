//! Platform backing store
//!
//! Minimal raw allocate/free/size primitives over the operating system heap.
//! Everything above this module only sees [`SystemHeap`]; the per-platform
//! files supply the `sys_*` functions.
//!
//! Exhaustion is fatal here: [`SystemHeap::allocate`] never hands back an
//! invalid pointer, it diverges through [`SystemHeap::on_out_of_memory`].

use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::error;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as sys;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as sys;

#[cfg(not(any(unix, windows)))]
compile_error!("undefined-memory supports unix and windows targets only");

/// Opaque block checked out from the backing store
///
/// Owned by the backing store until it is handed to an allocation header or
/// an arena, which then become responsible for returning it.
///
/// Move-only, so one block cannot end up with two owners:
///
/// ```compile_fail
/// use undefined_memory::platform::SystemHeap;
///
/// let block = SystemHeap::allocate_block(16);
/// let owner = block;
/// let second_owner = block; // use of moved value
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct RawBlock {
    /// First byte of the block
    pub ptr: NonNull<u8>,
    /// Number of bytes requested for the block
    pub size: usize,
}

/// Handle to the process heap
///
/// Zero-sized; every call goes straight to the OS allocator. Not a
/// thread-safety guarantee on its own: allocators that advertise
/// concurrency add their own serialization on top.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHeap;

impl SystemHeap {
    /// Reserves `size` bytes from the OS heap
    ///
    /// Zero-byte requests are passed down as one byte so the address is
    /// unique and can be freed. Never returns on exhaustion.
    #[inline]
    pub fn allocate(size: usize) -> NonNull<u8> {
        let request = size.max(1);
        // SAFETY: request is non-zero; the returned pointer is checked below.
        let raw = unsafe { sys::sys_malloc(request) };
        match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => Self::on_out_of_memory(request),
        }
    }

    /// Reserves a block and returns it with its size
    #[inline]
    pub fn allocate_block(size: usize) -> RawBlock {
        RawBlock {
            ptr: Self::allocate(size),
            size,
        }
    }

    /// Releases a block previously returned by [`SystemHeap::allocate`]
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`SystemHeap::allocate`] and must not have been
    /// freed already.
    #[inline]
    pub unsafe fn free(ptr: NonNull<u8>) {
        // SAFETY: forwarded caller contract.
        unsafe { sys::sys_free(ptr.as_ptr()) }
    }

    /// Best-effort usable size of a block
    ///
    /// Returns `None` when the platform has no usable-size query rather than
    /// guessing. The reported size may exceed what was requested.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block returned by [`SystemHeap::allocate`].
    #[inline]
    pub unsafe fn try_get_size(ptr: NonNull<u8>) -> Option<usize> {
        // SAFETY: forwarded caller contract.
        unsafe { sys::sys_usable_size(ptr.as_ptr()) }
    }

    /// Fatal out-of-memory path
    ///
    /// Logs the failed request and hands control to the standard allocation
    /// error handler, which aborts the process.
    #[cold]
    #[inline(never)]
    pub fn on_out_of_memory(size: usize) -> ! {
        #[cfg(feature = "logging")]
        error!(size, heap = Self::name(), "backing store exhausted");

        match core::alloc::Layout::from_size_align(size, 1) {
            Ok(layout) => std::alloc::handle_alloc_error(layout),
            Err(_) => std::process::abort(),
        }
    }

    /// Human-readable description of the backing heap
    pub fn name() -> &'static str {
        sys::NAME
    }
}
