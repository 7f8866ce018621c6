//! Memory subsystem configuration
//!
//! One [`MemoryConfig`] describes which allocator a [`MemoryContext`] is
//! built around and how it is tuned.
//!
//! [`MemoryContext`]: crate::context::MemoryContext

use core::fmt;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

use crate::error::{MemoryError, MemoryResult};
use crate::heap::HeapConfig;
use crate::stack::StackConfig;

/// Allocator variant a context is built around
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocatorKind {
    /// Single-threaded header-tracked heap
    Heap,
    /// Mutex-serialized header-tracked heap
    ConcurrentHeap,
    /// Single-threaded bump arena
    Stack { capacity: usize },
    /// Bump arena with an atomic cursor
    ConcurrentStack { capacity: usize },
}

impl AllocatorKind {
    /// Whether the resulting allocator may be shared across threads
    pub const fn is_concurrent(self) -> bool {
        matches!(self, Self::ConcurrentHeap | Self::ConcurrentStack { .. })
    }

    /// Arena capacity, if this is an arena
    pub const fn capacity(self) -> Option<usize> {
        match self {
            Self::Stack { capacity } | Self::ConcurrentStack { capacity } => Some(capacity),
            Self::Heap | Self::ConcurrentHeap => None,
        }
    }
}

impl fmt::Display for AllocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heap => write!(f, "heap"),
            Self::ConcurrentHeap => write!(f, "concurrent-heap"),
            Self::Stack { capacity } => write!(f, "stack({capacity})"),
            Self::ConcurrentStack { capacity } => write!(f, "concurrent-stack({capacity})"),
        }
    }
}

/// Complete memory subsystem configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    pub allocator: AllocatorKind,
    pub heap: HeapConfig,
    pub stack: StackConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            allocator: AllocatorKind::Heap,
            heap: HeapConfig::default(),
            stack: StackConfig::default(),
        }
    }
}

impl MemoryConfig {
    /// Production configuration - shareable heap, no tracking
    pub fn production() -> Self {
        Self {
            allocator: AllocatorKind::ConcurrentHeap,
            heap: HeapConfig::production(),
            stack: StackConfig::production(),
        }
    }

    /// Debug configuration - tracking and fill patterns everywhere
    pub fn debug() -> Self {
        Self {
            allocator: AllocatorKind::Heap,
            heap: HeapConfig::debug(),
            stack: StackConfig::debug(),
        }
    }

    /// Performance configuration - 1MB single-threaded arena
    pub fn performance() -> Self {
        Self {
            allocator: AllocatorKind::Stack { capacity: 1 << 20 },
            heap: HeapConfig::performance(),
            stack: StackConfig::performance(),
        }
    }

    /// Same configuration with a different allocator kind
    pub fn with_allocator(mut self, allocator: AllocatorKind) -> Self {
        self.allocator = allocator;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> MemoryResult<()> {
        #[cfg(feature = "logging")]
        debug!(allocator = %self.allocator, "validating memory configuration");

        self.heap
            .validate()
            .map_err(|e| MemoryError::invalid_config(format!("heap: {e}")))?;

        if let Some(capacity) = self.allocator.capacity() {
            if capacity == 0 {
                return Err(MemoryError::invalid_config("stack capacity cannot be zero"));
            }
            if capacity > isize::MAX as usize {
                return Err(MemoryError::invalid_config(
                    "stack capacity cannot exceed isize::MAX",
                ));
            }
            if !capacity.is_power_of_two() {
                #[cfg(feature = "logging")]
                warn!(capacity, "stack capacity is not a power of two");
            }
        }

        Ok(())
    }
}
