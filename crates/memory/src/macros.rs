//! Internal macros

/// Fails the build if an allocator's descriptor lacks a capability that one
/// of its trait impls relies on.
macro_rules! assert_capability {
    ($ty:ty, $field:ident) => {
        const _: () = assert!(
            <$ty as $crate::traits::Allocator>::CAPABILITIES.$field,
            concat!(stringify!($ty), " must declare ", stringify!($field))
        );
    };
}

/// Trace-level event, compiled out without the `logging` feature
macro_rules! trace_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::trace!($($arg)*);
        }
    };
}
