//! # undefined-memory
//!
//! Low-level dynamic memory for the Undefined engine: a pluggable allocator
//! front-end over the platform heap.
//!
//! - [`heap::HeapAllocator`]: general-purpose allocator. Every pointer carries
//!   a header recording its requested size and backing block, so it can be
//!   freed in any order and its size queried later.
//! - [`stack::StackAllocator`]: bump arena over one reserved block. O(1)
//!   allocation, bulk reset only.
//! - [`context::MemoryContext`]: the handle subsystems receive instead of a
//!   global. [`global`] holds one process-wide context for the rest.
//!
//! ## Quick Start
//!
//! ```rust
//! use undefined_memory::prelude::*;
//!
//! let heap = HeapAllocator::new();
//! let ptr = heap.malloc(64, 16)?;
//! assert_eq!(ptr.as_ptr() as usize % 16, 0);
//! // SAFETY: ptr is live and came from `heap`.
//! unsafe {
//!     assert_eq!(heap.try_get_allocation_size(ptr.as_ptr()), Some(64));
//!     heap.free(ptr.as_ptr());
//! }
//!
//! let mut arena = StackAllocator::local(1024)?;
//! let frame_data = arena.alloc_slice_copy(&[1.0_f32, 2.0, 3.0])?;
//! assert_eq!(frame_data.len(), 3);
//! arena.reset();
//! # Ok::<(), MemoryError>(())
//! ```
//!
//! Arenas cannot free individual pointers, and the compiler enforces it:
//!
//! ```compile_fail
//! use undefined_memory::prelude::*;
//!
//! let arena = StackAllocator::local(1024).unwrap();
//! let ptr = arena.malloc(8, 8).unwrap();
//! unsafe { arena.free(ptr.as_ptr()) }; // StackAllocator is not RandomFree
//! ```
//!
//! ## Features
//!
//! - `logging` (default): structured diagnostics through `tracing`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(unsafe_code)]
#![warn(rust_2018_idioms)]
// Arena helpers hand out `&mut T` from `&self`; regions never overlap
#![allow(clippy::mut_from_ref)]

#[macro_use]
mod macros;

pub mod capabilities;
pub mod config;
pub mod context;
pub mod error;
pub mod global;
pub mod header;
pub mod heap;
pub mod platform;
pub mod stack;
pub mod stats;
pub mod traits;
pub mod utils;

pub use capabilities::AllocatorCapabilities;
pub use config::{AllocatorKind, MemoryConfig};
pub use context::{AllocatorId, ManagedAllocator, MemoryContext, SharedMemoryContext};
pub use error::{MemoryError, MemoryResult};
pub use header::{AllocationHeader, HEADER_SIZE};
pub use heap::{ConcurrentHeapAllocator, HeapAllocator, HeapConfig};
pub use stack::{ConcurrentStackAllocator, StackAllocator, StackConfig};
pub use stats::{AllocatorStats, StatisticsProvider};
pub use traits::{
    Allocator, MemoryUsage, RandomFree, Reallocate, Resettable, ThreadSafeAllocator,
};
pub use utils::DEFAULT_ALIGNMENT;

/// Common imports
pub mod prelude {
    pub use crate::capabilities::AllocatorCapabilities;
    pub use crate::config::{AllocatorKind, MemoryConfig};
    pub use crate::context::{MemoryContext, SharedMemoryContext};
    pub use crate::error::{MemoryError, MemoryResult};
    pub use crate::heap::{ConcurrentHeapAllocator, HeapAllocator};
    pub use crate::stack::{ConcurrentStackAllocator, StackAllocator};
    pub use crate::stats::StatisticsProvider;
    pub use crate::traits::{
        Allocator, MemoryUsage, RandomFree, Reallocate, Resettable, ThreadSafeAllocator,
    };
    pub use crate::utils::DEFAULT_ALIGNMENT;
}
