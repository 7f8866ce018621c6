//! Unix backing store over libc malloc/free

use libc::c_void;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub(super) const NAME: &str = "Linux system heap (malloc/free)";

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub(super) const NAME: &str = "Darwin system heap (libsystem_malloc)";

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
pub(super) const NAME: &str = "Unix system heap (malloc/free)";

#[inline]
pub(super) unsafe fn sys_malloc(size: usize) -> *mut u8 {
    // SAFETY: malloc accepts any size and reports failure with null.
    unsafe { libc::malloc(size).cast::<u8>() }
}

#[inline]
pub(super) unsafe fn sys_free(ptr: *mut u8) {
    // SAFETY: caller guarantees ptr came from sys_malloc.
    unsafe { libc::free(ptr.cast::<c_void>()) }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[inline]
pub(super) unsafe fn sys_usable_size(ptr: *mut u8) -> Option<usize> {
    // SAFETY: caller guarantees ptr is a live malloc block.
    let size = unsafe { libc::malloc_usable_size(ptr.cast::<c_void>()) };
    (size != 0).then_some(size)
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
#[inline]
pub(super) unsafe fn sys_usable_size(ptr: *mut u8) -> Option<usize> {
    // SAFETY: caller guarantees ptr is a live malloc block.
    let size = unsafe { libc::malloc_size(ptr.cast::<c_void>().cast_const()) };
    (size != 0).then_some(size)
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
#[inline]
pub(super) unsafe fn sys_usable_size(_ptr: *mut u8) -> Option<usize> {
    None
}
