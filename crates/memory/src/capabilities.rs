//! Allocator capability descriptor

use core::fmt;

/// Type-level description of what an allocator variant permits
///
/// Every allocator exposes one as `Allocator::CAPABILITIES`. The trait
/// split in [`crate::traits`] enforces it statically; type-erased callers
/// read a copy at runtime through [`crate::context::MemoryContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocatorCapabilities {
    /// Individual pointers can be freed in any order
    pub can_random_free: bool,
    /// Live allocations can be resized
    pub is_reallocation_allowed: bool,
    /// `malloc` and `free` may be called from several threads at once
    pub is_concurrent: bool,
}

impl AllocatorCapabilities {
    /// General-purpose heap allocator
    pub const GENERAL: Self = Self {
        can_random_free: true,
        is_reallocation_allowed: true,
        is_concurrent: false,
    };

    /// Bump arena: bulk reset only
    pub const ARENA: Self = Self {
        can_random_free: false,
        is_reallocation_allowed: false,
        is_concurrent: false,
    };

    /// Same descriptor with `is_concurrent` set
    #[must_use]
    pub const fn concurrent(self) -> Self {
        Self {
            is_concurrent: true,
            ..self
        }
    }

    #[must_use]
    pub const fn with_concurrency(self, is_concurrent: bool) -> Self {
        Self {
            is_concurrent,
            ..self
        }
    }

    #[must_use]
    pub const fn with_random_free(self, can_random_free: bool) -> Self {
        Self {
            can_random_free,
            ..self
        }
    }

    #[must_use]
    pub const fn with_reallocation(self, is_reallocation_allowed: bool) -> Self {
        Self {
            is_reallocation_allowed,
            ..self
        }
    }
}

impl Default for AllocatorCapabilities {
    fn default() -> Self {
        Self::GENERAL
    }
}

impl fmt::Display for AllocatorCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "random_free={}, realloc={}, concurrent={}",
            self.can_random_free, self.is_reallocation_allowed, self.is_concurrent
        )
    }
}
