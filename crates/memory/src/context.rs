//! Active-allocator handle
//!
//! Subsystems that allocate receive a [`MemoryContext`] explicitly instead of
//! reaching for ambient state. The context type-erases the allocator, so a
//! heap and an arena can be swapped without touching callers, while the
//! capability descriptor still travels with it.
//!
//! For code that cannot thread a context through, [`crate::global`] holds one
//! process-wide [`SharedMemoryContext`].

use core::fmt;
use core::num::NonZeroUsize;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "logging")]
use tracing::debug;

use crate::capabilities::AllocatorCapabilities;
use crate::config::{AllocatorKind, MemoryConfig};
use crate::error::{MemoryError, MemoryResult};
use crate::heap::{ConcurrentHeapAllocator, HeapAllocator};
use crate::stack::{CellCursor, ConcurrentStackAllocator, StackAllocator};
use crate::traits::{Allocator, ThreadSafeAllocator};

/// Unique identifier for a context's allocator
///
/// Uses NonZeroUsize so `Option<AllocatorId>` stays one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocatorId(NonZeroUsize);

impl AllocatorId {
    /// Generate a new process-unique ID
    #[must_use]
    pub fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(1);
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroUsize::new(id).unwrap_or(NonZeroUsize::MIN))
    }

    /// Raw ID value
    #[inline]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for AllocatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AllocatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "allocator#{}", self.0)
    }
}

/// Type-erased allocator view
///
/// Object safe; implemented for every [`Allocator`]. Capability-gated
/// operations go through `try_free`/`try_realloc`, so an arena answers
/// `free` with [`MemoryError::NotSupported`] instead of touching memory.
pub trait ManagedAllocator {
    fn managed_malloc(&self, size: usize, alignment: usize) -> MemoryResult<NonNull<u8>>;

    /// # Safety
    ///
    /// A non-null `ptr` must be a live allocation from this allocator.
    unsafe fn managed_free(&self, ptr: *mut u8) -> MemoryResult<()>;

    /// # Safety
    ///
    /// A non-null `ptr` must be a live allocation from this allocator.
    unsafe fn managed_allocation_size(&self, ptr: *const u8) -> Option<usize>;

    /// # Safety
    ///
    /// A non-null `ptr` must be a live allocation from this allocator.
    unsafe fn managed_realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        alignment: usize,
    ) -> MemoryResult<NonNull<u8>>;

    fn managed_reset(&mut self) -> MemoryResult<()>;

    fn managed_capabilities(&self) -> AllocatorCapabilities;

    fn managed_name(&self) -> &'static str;
}

impl<A: Allocator> ManagedAllocator for A {
    #[inline]
    fn managed_malloc(&self, size: usize, alignment: usize) -> MemoryResult<NonNull<u8>> {
        self.malloc(size, alignment)
    }

    #[inline]
    unsafe fn managed_free(&self, ptr: *mut u8) -> MemoryResult<()> {
        // SAFETY: forwarded caller contract.
        unsafe { self.try_free(ptr) }
    }

    #[inline]
    unsafe fn managed_allocation_size(&self, ptr: *const u8) -> Option<usize> {
        // SAFETY: forwarded caller contract.
        unsafe { self.try_get_allocation_size(ptr) }
    }

    #[inline]
    unsafe fn managed_realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        alignment: usize,
    ) -> MemoryResult<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        unsafe { self.try_realloc(ptr, new_size, alignment) }
    }

    #[inline]
    fn managed_reset(&mut self) -> MemoryResult<()> {
        self.try_reset()
    }

    fn managed_capabilities(&self) -> AllocatorCapabilities {
        A::CAPABILITIES
    }

    fn managed_name(&self) -> &'static str {
        self.name()
    }
}

/// Explicit allocator handle threaded through subsystems
///
/// The default parameter erases any allocator; [`SharedMemoryContext`]
/// additionally requires the allocator to be thread-safe so the context can
/// be shared.
pub struct MemoryContext<M: ?Sized + ManagedAllocator = dyn ManagedAllocator> {
    id: AllocatorId,
    allocator: Box<M>,
}

/// Context that can be shared between threads
pub type SharedMemoryContext = MemoryContext<dyn ManagedAllocator + Send + Sync>;

impl MemoryContext {
    /// Wraps any allocator
    pub fn new<A: Allocator + 'static>(allocator: A) -> Self {
        Self::from_boxed(Box::new(allocator))
    }

    /// Builds the allocator described by `config`
    pub fn from_config(config: &MemoryConfig) -> MemoryResult<Self> {
        config.validate()?;
        let context = match config.allocator {
            AllocatorKind::Heap => Self::new(HeapAllocator::with_config(config.heap.clone())),
            AllocatorKind::ConcurrentHeap => {
                Self::new(ConcurrentHeapAllocator::with_config(config.heap.clone()))
            }
            AllocatorKind::Stack { capacity } => Self::new(StackAllocator::<CellCursor>::with_config(
                capacity,
                config.stack.clone(),
            )?),
            AllocatorKind::ConcurrentStack { capacity } => Self::new(
                ConcurrentStackAllocator::with_config(capacity, config.stack.clone())?,
            ),
        };
        Ok(context)
    }
}

impl SharedMemoryContext {
    /// Wraps a thread-safe allocator
    pub fn shared<A: ThreadSafeAllocator + 'static>(allocator: A) -> Self {
        Self::from_boxed(Box::new(allocator))
    }

    /// Builds the thread-safe allocator described by `config`
    ///
    /// Single-threaded kinds are rejected with
    /// [`MemoryError::InvalidConfig`].
    pub fn shared_from_config(config: &MemoryConfig) -> MemoryResult<Self> {
        config.validate()?;
        match config.allocator {
            AllocatorKind::ConcurrentHeap => Ok(Self::shared(
                ConcurrentHeapAllocator::with_config(config.heap.clone()),
            )),
            AllocatorKind::ConcurrentStack { capacity } => Ok(Self::shared(
                ConcurrentStackAllocator::with_config(capacity, config.stack.clone())?,
            )),
            kind @ (AllocatorKind::Heap | AllocatorKind::Stack { .. }) => Err(
                MemoryError::invalid_config(format!("{kind} allocator is not thread-safe")),
            ),
        }
    }
}

impl<M: ?Sized + ManagedAllocator> MemoryContext<M> {
    fn from_boxed(allocator: Box<M>) -> Self {
        let context = Self {
            id: AllocatorId::new(),
            allocator,
        };

        #[cfg(feature = "logging")]
        debug!(id = %context.id, allocator = context.name(), "memory context created");

        context
    }

    /// Allocates `size` bytes aligned to `alignment` (`0` for natural)
    #[inline]
    pub fn malloc(&self, size: usize, alignment: usize) -> MemoryResult<NonNull<u8>> {
        self.allocator.managed_malloc(size, alignment)
    }

    /// Frees `ptr` if the allocator supports individual frees
    ///
    /// Null is `Ok(())` on allocators that can free. Arenas reject every
    /// call with [`MemoryError::NotSupported`].
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be a live allocation from this context.
    #[inline]
    pub unsafe fn free(&self, ptr: *mut u8) -> MemoryResult<()> {
        // SAFETY: forwarded caller contract.
        unsafe { self.allocator.managed_free(ptr) }
    }

    /// Originally requested size of `ptr`, if the allocator records it
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be a live allocation from this context.
    #[inline]
    pub unsafe fn try_get_allocation_size(&self, ptr: *const u8) -> Option<usize> {
        // SAFETY: forwarded caller contract.
        unsafe { self.allocator.managed_allocation_size(ptr) }
    }

    /// Resizes `ptr` if the allocator supports reallocation
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be a live allocation from this context.
    #[inline]
    pub unsafe fn realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        alignment: usize,
    ) -> MemoryResult<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        unsafe { self.allocator.managed_realloc(ptr, new_size, alignment) }
    }

    /// Releases everything at once on allocators that support bulk reset
    ///
    /// Arenas rewind to empty; heaps reject the call with
    /// [`MemoryError::NotSupported`]. Requires `&mut self`, so the
    /// process-wide handle can never be reset.
    pub fn reset(&mut self) -> MemoryResult<()> {
        self.allocator.managed_reset()
    }

    pub fn capabilities(&self) -> AllocatorCapabilities {
        self.allocator.managed_capabilities()
    }

    pub fn name(&self) -> &'static str {
        self.allocator.managed_name()
    }

    pub fn id(&self) -> AllocatorId {
        self.id
    }
}

impl<M: ?Sized + ManagedAllocator> fmt::Debug for MemoryContext<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContext")
            .field("id", &self.id)
            .field("allocator", &self.name())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
