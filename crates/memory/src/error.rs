//! Error types for undefined-memory
//!
//! Uses thiserror for clean, idiomatic Rust error definitions. Only two
//! conditions in this crate are not represented here: backing-store
//! exhaustion and use of the global handle before install. Both are fatal.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::warn;

// ============================================================================
// Main Error Type
// ============================================================================

/// Memory subsystem errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Allocation Errors ---
    #[error("Invalid alignment: {alignment} (must be a power of two)")]
    InvalidAlignment { alignment: usize },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: &'static str },

    #[error("Allocation exceeds maximum size: {size} bytes (max: {max_size})")]
    ExceedsMaxSize { size: usize, max_size: usize },

    // --- Arena Errors ---
    #[error("Arena exhausted: requested {requested} bytes, available {available} of {capacity}")]
    ArenaExhausted {
        requested: usize,
        available: usize,
        capacity: usize,
    },

    // --- Capability Errors ---
    #[error("Operation '{operation}' is not supported by {allocator}")]
    NotSupported {
        operation: &'static str,
        allocator: &'static str,
    },

    // --- Configuration Errors ---
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // --- Global Handle Errors ---
    #[error("Active allocator is already installed")]
    AlreadyInitialized,
}

impl MemoryError {
    /// Check if error is retryable
    ///
    /// Only arena exhaustion qualifies: the caller can reset the arena or
    /// fall back to another allocator and try again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ArenaExhausted { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAlignment { .. } => "MEM:ALLOC:ALIGN",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::ExceedsMaxSize { .. } => "MEM:ALLOC:MAX",
            Self::ArenaExhausted { .. } => "MEM:ARENA:EXHAUSTED",
            Self::NotSupported { .. } => "MEM:CAPABILITY:UNSUPPORTED",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
            Self::AlreadyInitialized => "MEM:HANDLE:ALREADY_INIT",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &'static str) -> Self {
        Self::SizeOverflow { operation }
    }

    /// Create allocation too large error
    pub fn allocation_too_large(size: usize, max_size: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(size, max_size, "allocation exceeds configured maximum");

        Self::ExceedsMaxSize { size, max_size }
    }

    /// Create arena exhausted error
    pub fn arena_exhausted(requested: usize, available: usize, capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(requested, available, capacity, "arena exhausted");

        Self::ArenaExhausted {
            requested,
            available,
            capacity,
        }
    }

    /// Create capability violation error
    pub fn not_supported(operation: &'static str, allocator: &'static str) -> Self {
        #[cfg(feature = "logging")]
        warn!(operation, allocator, "rejected operation outside allocator capabilities");

        Self::NotSupported {
            operation,
            allocator,
        }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Result type for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;
