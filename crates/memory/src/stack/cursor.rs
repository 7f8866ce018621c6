//! Cursor implementations for the stack allocator
//!
//! Provides both atomic (thread-safe) and cell-based (single-thread) cursors.
//! The cursor is a byte offset from the arena base.

use core::cell::Cell;
use core::sync::atomic::{AtomicUsize, Ordering};

mod private {
    pub trait Sealed {}

    impl Sealed for super::CellCursor {}
    impl Sealed for super::AtomicCursor {}
}

/// Cursor abstraction (atomic or cell-based)
///
/// Sealed: the arena's soundness depends on the exact semantics of these two
/// implementations.
pub trait Cursor: private::Sealed {
    /// Whether the cursor may be advanced from several threads at once
    const CONCURRENT: bool;

    #[doc(hidden)]
    fn new(val: usize) -> Self;
    #[doc(hidden)]
    fn load(&self, ordering: Ordering) -> usize;
    #[doc(hidden)]
    fn store(&self, val: usize, ordering: Ordering);
    #[doc(hidden)]
    fn compare_exchange_weak(
        &self,
        current: usize,
        new: usize,
        success: Ordering,
        failure: Ordering,
    ) -> Result<usize, usize>;
}

/// Atomic cursor for multi-threaded access
#[derive(Debug)]
pub struct AtomicCursor(AtomicUsize);

impl Cursor for AtomicCursor {
    const CONCURRENT: bool = true;

    fn new(val: usize) -> Self {
        Self(AtomicUsize::new(val))
    }

    #[inline]
    fn load(&self, ordering: Ordering) -> usize {
        self.0.load(ordering)
    }

    #[inline]
    fn store(&self, val: usize, ordering: Ordering) {
        self.0.store(val, ordering);
    }

    #[inline]
    fn compare_exchange_weak(
        &self,
        current: usize,
        new: usize,
        success: Ordering,
        failure: Ordering,
    ) -> Result<usize, usize> {
        self.0.compare_exchange_weak(current, new, success, failure)
    }
}

/// Cell-based cursor for single-threaded access (no atomic overhead)
///
/// `Cell` keeps it `!Sync`, so an arena using it cannot be shared.
#[derive(Debug)]
pub struct CellCursor(Cell<usize>);

impl Cursor for CellCursor {
    const CONCURRENT: bool = false;

    fn new(val: usize) -> Self {
        Self(Cell::new(val))
    }

    #[inline]
    fn load(&self, _ordering: Ordering) -> usize {
        self.0.get()
    }

    #[inline]
    fn store(&self, val: usize, _ordering: Ordering) {
        self.0.set(val);
    }

    #[inline]
    fn compare_exchange_weak(
        &self,
        current: usize,
        new: usize,
        _success: Ordering,
        _failure: Ordering,
    ) -> Result<usize, usize> {
        let actual = self.0.get();
        if actual == current {
            self.0.set(new);
            Ok(actual)
        } else {
            Err(actual)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<C: Cursor>() {
        let cursor = C::new(0);
        assert_eq!(cursor.load(Ordering::Acquire), 0);
        // weak CAS may fail spuriously on the atomic cursor
        while cursor
            .compare_exchange_weak(0, 8, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {}
        assert_eq!(cursor.load(Ordering::Acquire), 8);
        assert_eq!(
            cursor.compare_exchange_weak(0, 16, Ordering::AcqRel, Ordering::Acquire),
            Err(8)
        );
        cursor.store(0, Ordering::Release);
        assert_eq!(cursor.load(Ordering::Acquire), 0);
    }

    #[test]
    fn cell_cursor() {
        exercise::<CellCursor>();
    }

    #[test]
    fn atomic_cursor() {
        exercise::<AtomicCursor>();
    }

    #[test]
    fn thread_bounds() {
        fn assert_sync<T: Sync>() {}
        fn assert_send<T: Send>() {}
        assert_sync::<AtomicCursor>();
        assert_send::<CellCursor>();
    }
}
