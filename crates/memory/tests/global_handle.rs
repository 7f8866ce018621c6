//! The process-wide handle installs once and stays put.
//!
//! Lives in its own test binary because the handle cannot be uninstalled.
#![allow(unsafe_code)]

use undefined_memory::global;
use undefined_memory::prelude::*;

#[test]
fn install_once_then_use() {
    assert!(global::try_get().is_none());
    assert!(!global::is_installed());

    // Single-threaded kinds never reach the handle
    let err = global::install_from_config(&MemoryConfig::debug()).unwrap_err();
    assert!(matches!(err, MemoryError::InvalidConfig { .. }));
    assert!(!global::is_installed());

    let installed =
        global::install_allocator(ConcurrentHeapAllocator::production()).expect("first install");
    let id = installed.id();
    assert_eq!(installed.name(), "ConcurrentHeapAllocator");

    let err = global::install_allocator(ConcurrentStackAllocator::shared(4096).expect("arena"))
        .unwrap_err();
    assert_eq!(err, MemoryError::AlreadyInitialized);
    assert_eq!(global::get().id(), id);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(move || {
                let ctx = global::get();
                let p = ctx.malloc(256, 64).expect("alloc");
                assert_eq!(p.as_ptr() as usize % 64, 0);
                // SAFETY: p is live and from the installed heap.
                unsafe { ctx.free(p.as_ptr()).expect("free") };
                ctx.id()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("worker panicked"), id);
    }
}
