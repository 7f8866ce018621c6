//! Allocation header
//!
//! Every pointer handed out by a header-tracking allocator is preceded by an
//! [`AllocationHeader`]:
//!
//! ```text
//! raw ─┬─ padding ─┬─ AllocationHeader ─┬─ data (data_size bytes) ─┬─ slack
//!      │           │ data_size|original │                          │
//!      └───────────┴────────────────────┴▲─────────────────────────┘
//!                                        └ aligned pointer returned to caller
//! ```
//!
//! This module is the only place that reads or writes memory in front of a
//! caller-visible pointer.

use core::ptr::NonNull;

/// Metadata stored immediately before each tracked allocation
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationHeader {
    /// Size the caller asked for, not the padded backing size
    pub data_size: usize,
    /// Unaligned pointer returned by the backing store
    pub original: *mut u8,
}

/// Size of [`AllocationHeader`] in bytes
pub const HEADER_SIZE: usize = size_of::<AllocationHeader>();

const _: () = assert!(HEADER_SIZE == 2 * size_of::<usize>());
const _: () = assert!(align_of::<AllocationHeader>() == align_of::<usize>());

impl AllocationHeader {
    /// Creates a header for a block
    #[inline]
    pub const fn new(data_size: usize, original: *mut u8) -> Self {
        Self {
            data_size,
            original,
        }
    }

    /// Address of the header slot belonging to `data`
    #[inline(always)]
    fn slot(data: NonNull<u8>) -> *mut AllocationHeader {
        data.as_ptr().wrapping_sub(HEADER_SIZE).cast::<AllocationHeader>()
    }

    /// Writes `self` into the slot preceding `data`
    ///
    /// # Safety
    ///
    /// The `HEADER_SIZE` bytes before `data` must be writable and belong to
    /// the same backing block, and `data` must be word aligned.
    #[inline]
    pub unsafe fn write_before(self, data: NonNull<u8>) {
        let slot = Self::slot(data);
        debug_assert!(slot.is_aligned());
        // SAFETY: caller guarantees the slot is in-bounds, writable and aligned.
        unsafe { slot.write(self) }
    }

    /// Reads the header preceding `data`
    ///
    /// # Safety
    ///
    /// `data` must be a live pointer produced by a header-tracking allocator.
    #[inline]
    pub unsafe fn read_before(data: NonNull<u8>) -> Self {
        let slot = Self::slot(data);
        debug_assert!(slot.is_aligned());
        // SAFETY: caller guarantees a header was written before data.
        unsafe { slot.read() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_two_words() {
        assert_eq!(HEADER_SIZE, 2 * size_of::<usize>());
        #[cfg(target_pointer_width = "64")]
        assert_eq!(HEADER_SIZE, 16);
    }

    #[test]
    fn write_then_read_in_local_buffer() {
        let mut buf = [0usize; 8];
        let base = buf.as_mut_ptr().cast::<u8>();
        // SAFETY: offset 4 words stays inside buf and is word aligned.
        let data = unsafe { NonNull::new_unchecked(base.add(4 * size_of::<usize>())) };

        let header = AllocationHeader::new(42, base);
        // SAFETY: the two words before data are inside buf.
        unsafe {
            header.write_before(data);
            assert_eq!(AllocationHeader::read_before(data), header);
        }
        assert_eq!(buf[2], 42);
        assert_eq!(buf[3], base as usize);
    }
}
