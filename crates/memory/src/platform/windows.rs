//! Windows backing store over the process heap

use winapi::shared::basetsd::SIZE_T;
use winapi::um::heapapi::{GetProcessHeap, HeapAlloc, HeapFree, HeapSize};

pub(super) const NAME: &str = "Windows process heap (HeapAlloc)";

#[inline]
pub(super) unsafe fn sys_malloc(size: usize) -> *mut u8 {
    // SAFETY: the process heap lives for the whole process; HeapAlloc
    // reports failure with null.
    unsafe {
        let heap = GetProcessHeap();
        if heap.is_null() {
            return core::ptr::null_mut();
        }
        HeapAlloc(heap, 0, size as SIZE_T).cast::<u8>()
    }
}

#[inline]
pub(super) unsafe fn sys_free(ptr: *mut u8) {
    // SAFETY: caller guarantees ptr came from sys_malloc on the process heap.
    let ok = unsafe { HeapFree(GetProcessHeap(), 0, ptr.cast()) };
    debug_assert!(ok != 0, "HeapFree rejected a block");
}

#[inline]
pub(super) unsafe fn sys_usable_size(ptr: *mut u8) -> Option<usize> {
    // SAFETY: caller guarantees ptr is a live process-heap block.
    let size = unsafe { HeapSize(GetProcessHeap(), 0, ptr.cast_const().cast()) };
    // HeapSize signals failure with (SIZE_T)-1
    if size == SIZE_T::MAX { None } else { Some(size) }
}
