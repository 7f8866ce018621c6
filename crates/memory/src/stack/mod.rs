//! A bump-pointer arena for short-lived scopes.
//!
//! ## Modules
//! - `allocator` - Main `StackAllocator` implementation with bulk reset
//! - `config` - Configuration variants (production, debug, performance)
//! - `cursor` - Single-threaded and atomic cursor strategies
mod allocator;
mod config;
mod cursor;

pub use allocator::{ConcurrentStackAllocator, StackAllocator};
pub use config::StackConfig;
pub use cursor::{AtomicCursor, CellCursor, Cursor};
