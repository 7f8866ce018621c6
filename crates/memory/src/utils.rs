//! Alignment helpers and small atomic utilities
//!
//! Every address computation in the crate goes through these functions so
//! that the mask arithmetic lives in exactly one place.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Alignment used when the caller passes `0`, i.e. "natural word alignment"
pub const DEFAULT_ALIGNMENT: usize = 0;

/// Natural machine word alignment
pub const WORD_ALIGNMENT: usize = align_of::<usize>();

/// Aligns a value up to the nearest multiple of alignment
///
/// `alignment` must be zero or a power of two. Zero and one both leave the
/// value unchanged.
///
/// # Examples
/// ```
/// use undefined_memory::utils::align_up;
///
/// assert_eq!(align_up(7, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// assert_eq!(align_up(9, 1), 9);
/// assert_eq!(align_up(9, 0), 9);
/// ```
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return value;
    }
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Checked variant of [`align_up`]
///
/// Returns `None` for a non-power-of-two alignment or when the rounded
/// value does not fit in `usize`.
#[inline]
pub const fn checked_align_up(value: usize, alignment: usize) -> Option<usize> {
    if alignment <= 1 {
        return Some(value);
    }
    if !alignment.is_power_of_two() {
        return None;
    }
    match value.checked_add(alignment - 1) {
        Some(v) => Some(v & !(alignment - 1)),
        None => None,
    }
}

/// Checks if a value is aligned to the given alignment
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    if alignment <= 1 {
        return true;
    }
    debug_assert!(alignment.is_power_of_two());
    value & (alignment - 1) == 0
}

/// Calculates padding needed to align a value
#[inline(always)]
pub const fn padding_needed(value: usize, alignment: usize) -> usize {
    align_up(value, alignment) - value
}

/// Alignment the general allocator actually uses for a request
///
/// `0` and `1` mean natural word alignment, and anything below word size is
/// raised to it so the allocation header stays aligned.
#[inline(always)]
pub const fn effective_alignment(alignment: usize) -> usize {
    if alignment < WORD_ALIGNMENT {
        WORD_ALIGNMENT
    } else {
        alignment
    }
}

/// Resolves [`DEFAULT_ALIGNMENT`] to natural word alignment
///
/// Every other value, including `1`, passes through unchanged.
#[inline(always)]
pub const fn resolve_alignment(alignment: usize) -> usize {
    if alignment == DEFAULT_ALIGNMENT {
        WORD_ALIGNMENT
    } else {
        alignment
    }
}

/// Returns true for `0` (natural) or any power of two
#[inline(always)]
pub const fn is_valid_alignment(alignment: usize) -> bool {
    alignment == 0 || alignment.is_power_of_two()
}

/// Atomically raises `current` to `value` if `value` is larger
pub fn atomic_max(current: &AtomicUsize, value: usize) {
    let mut max = current.load(Ordering::Relaxed);
    while value > max {
        match current.compare_exchange_weak(max, value, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(x) => max = x,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn align_up_basic() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(15, 16), 16);
        assert_eq!(align_up(17, 16), 32);
    }

    #[test]
    fn zero_and_one_never_mask() {
        for v in [0, 1, 7, 4095, usize::MAX] {
            assert_eq!(align_up(v, 0), v);
            assert_eq!(align_up(v, 1), v);
        }
    }

    #[test]
    fn checked_align_up_rejects_bad_input() {
        assert_eq!(checked_align_up(10, 3), None);
        assert_eq!(checked_align_up(usize::MAX, 16), None);
        assert_eq!(checked_align_up(10, 4), Some(12));
    }

    #[test]
    fn effective_alignment_raises_small_values() {
        assert_eq!(effective_alignment(0), WORD_ALIGNMENT);
        assert_eq!(effective_alignment(1), WORD_ALIGNMENT);
        assert_eq!(effective_alignment(2), WORD_ALIGNMENT);
        assert_eq!(effective_alignment(64), 64);
    }

    #[test]
    fn resolve_alignment_only_maps_default() {
        assert_eq!(resolve_alignment(DEFAULT_ALIGNMENT), WORD_ALIGNMENT);
        assert_eq!(resolve_alignment(1), 1);
        assert_eq!(resolve_alignment(2), 2);
        assert_eq!(resolve_alignment(128), 128);
    }

    #[test]
    fn atomic_max_only_grows() {
        let v = AtomicUsize::new(10);
        atomic_max(&v, 5);
        assert_eq!(v.load(Ordering::Relaxed), 10);
        atomic_max(&v, 42);
        assert_eq!(v.load(Ordering::Relaxed), 42);
    }

    proptest! {
        #[test]
        fn align_one_is_identity(v in any::<usize>()) {
            prop_assert_eq!(align_up(v, 1), v);
        }

        #[test]
        fn align_zero_value_stays_zero(shift in 0u32..16) {
            prop_assert_eq!(align_up(0, 1usize << shift), 0);
        }

        #[test]
        fn aligned_result_is_minimal(v in 0usize..1 << 40, shift in 0u32..12) {
            let a = 1usize << shift;
            let r = align_up(v, a);
            prop_assert!(is_aligned(r, a));
            prop_assert!(r >= v);
            prop_assert!(r - v < a);
            prop_assert_eq!(padding_needed(v, a), r - v);
        }
    }
}
