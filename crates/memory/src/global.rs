//! Process-wide active allocator
//!
//! The handle is installed exactly once, typically at startup before other
//! threads exist. It is never default-constructed: calling [`get`] before
//! [`install`] is a fatal programming error.
//!
//! Only thread-safe allocators can be installed. Single-threaded allocators
//! are used through an explicitly passed [`MemoryContext`].
//!
//! [`MemoryContext`]: crate::context::MemoryContext

use std::sync::OnceLock;

#[cfg(feature = "logging")]
use tracing::{debug, error};

use crate::config::MemoryConfig;
use crate::context::SharedMemoryContext;
use crate::error::{MemoryError, MemoryResult};
use crate::traits::ThreadSafeAllocator;

static ACTIVE: OnceLock<SharedMemoryContext> = OnceLock::new();

/// Installs `context` as the process-wide allocator
///
/// Fails with [`MemoryError::AlreadyInitialized`] if a context is already
/// installed; the existing one stays active.
pub fn install(context: SharedMemoryContext) -> MemoryResult<&'static SharedMemoryContext> {
    let mut installed = false;
    let active = ACTIVE.get_or_init(|| {
        installed = true;
        context
    });
    if !installed {
        return Err(MemoryError::AlreadyInitialized);
    }

    #[cfg(feature = "logging")]
    debug!(id = %active.id(), allocator = active.name(), "active allocator installed");

    Ok(active)
}

/// Wraps `allocator` in a context and installs it
pub fn install_allocator<A: ThreadSafeAllocator + 'static>(
    allocator: A,
) -> MemoryResult<&'static SharedMemoryContext> {
    install(SharedMemoryContext::shared(allocator))
}

/// Builds the allocator described by `config` and installs it
pub fn install_from_config(config: &MemoryConfig) -> MemoryResult<&'static SharedMemoryContext> {
    install(SharedMemoryContext::shared_from_config(config)?)
}

/// Returns the installed context
///
/// # Panics
///
/// Panics if nothing has been installed yet.
pub fn get() -> &'static SharedMemoryContext {
    match ACTIVE.get() {
        Some(active) => active,
        None => not_installed(),
    }
}

/// Returns the installed context, if any
pub fn try_get() -> Option<&'static SharedMemoryContext> {
    ACTIVE.get()
}

pub fn is_installed() -> bool {
    ACTIVE.get().is_some()
}

#[cold]
#[inline(never)]
fn not_installed() -> ! {
    #[cfg(feature = "logging")]
    error!("active allocator used before install");

    panic!("active allocator not installed; call undefined_memory::global::install() first")
}
