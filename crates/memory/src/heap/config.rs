//! Heap allocator configuration

use crate::error::{MemoryError, MemoryResult};

/// Configuration for the general heap allocator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill patterns for debugging
    pub alloc_pattern: Option<u8>,
    pub dealloc_pattern: Option<u8>,

    /// Largest single request accepted; `None` means no limit
    pub max_allocation_size: Option<usize>,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) { Some(0xCC) } else { None },
            dealloc_pattern: if cfg!(debug_assertions) { Some(0xDD) } else { None },
            max_allocation_size: None,
        }
    }
}

impl HeapConfig {
    /// Production configuration - optimized for performance
    pub fn production() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
            max_allocation_size: None,
        }
    }

    /// Debug configuration - optimized for debugging
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            alloc_pattern: Some(0xCC),
            dealloc_pattern: Some(0xDD),
            max_allocation_size: Some(1 << 30), // 1GB
        }
    }

    /// Performance configuration - minimal overhead
    pub fn performance() -> Self {
        Self::production()
    }

    pub fn validate(&self) -> MemoryResult<()> {
        if self.max_allocation_size == Some(0) {
            return Err(MemoryError::invalid_config(
                "heap max_allocation_size cannot be zero",
            ));
        }
        Ok(())
    }
}
