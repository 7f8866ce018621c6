//! General-purpose heap allocator
//!
//! ## Modules
//! - `allocator` - `HeapAllocator` and its mutex-serialized concurrent variant
//! - `config` - Configuration variants (production, debug, performance)
mod allocator;
mod config;

pub use allocator::{ConcurrentHeapAllocator, HeapAllocator};
pub use config::HeapConfig;
