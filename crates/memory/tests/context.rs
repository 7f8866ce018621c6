//! Swapping allocators behind a context without touching callers.
#![allow(unsafe_code)]

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use rstest::rstest;
use undefined_memory::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

/// A subsystem that only knows about the context it was handed
fn build_frame(ctx: &MemoryContext, vertices: usize) -> MemoryResult<usize> {
    let mut total = 0;
    for i in 0..vertices {
        let p = ctx.malloc(16 * (i + 1), 16)?;
        assert_eq!(p.as_ptr() as usize % 16, 0);
        total += 16 * (i + 1);
        if ctx.capabilities().can_random_free {
            // SAFETY: p is live and from ctx.
            unsafe { ctx.free(p.as_ptr())? };
        }
    }
    Ok(total)
}

#[rstest]
#[case::heap(AllocatorKind::Heap)]
#[case::concurrent_heap(AllocatorKind::ConcurrentHeap)]
#[case::stack(AllocatorKind::Stack { capacity: 64 * 1024 })]
#[case::concurrent_stack(AllocatorKind::ConcurrentStack { capacity: 64 * 1024 })]
fn subsystem_runs_on_any_allocator(#[case] kind: AllocatorKind) {
    init_tracing();
    let config = MemoryConfig::debug().with_allocator(kind);
    let ctx = MemoryContext::from_config(&config).expect("context");
    assert_eq!(ctx.capabilities().is_concurrent, kind.is_concurrent());
    assert_eq!(build_frame(&ctx, 8).expect("frame"), 16 * 36);
}

#[test]
fn arena_context_rejects_free_and_realloc() {
    init_tracing();
    let ctx = MemoryContext::new(StackAllocator::local(1024).expect("arena"));
    let p = ctx.malloc(32, 8).expect("alloc");

    for _ in 0..3 {
        // SAFETY: arena free never touches memory.
        let err = unsafe { ctx.free(p.as_ptr()) }.unwrap_err();
        assert!(matches!(err, MemoryError::NotSupported { operation: "free", .. }));
    }
    // SAFETY: as above.
    let err = unsafe { ctx.realloc(p.as_ptr(), 64, 8) }.unwrap_err();
    assert_eq!(err.code(), "MEM:CAPABILITY:UNSUPPORTED");
}

#[rstest]
#[case::stack(AllocatorKind::Stack { capacity: 1024 })]
#[case::concurrent_stack(AllocatorKind::ConcurrentStack { capacity: 1024 })]
fn arena_context_reset_restores_capacity(#[case] kind: AllocatorKind) {
    let mut ctx = MemoryContext::from_config(&MemoryConfig::performance().with_allocator(kind))
        .expect("context");
    let first = ctx.malloc(100, 16).expect("first");
    while ctx.malloc(100, 16).is_ok() {}

    ctx.reset().expect("arena reset");
    assert_eq!(ctx.malloc(100, 16).expect("after reset"), first);
    for _ in 0..8 {
        ctx.malloc(100, 16).expect("capacity restored");
    }
}

#[rstest]
#[case::heap(AllocatorKind::Heap)]
#[case::concurrent_heap(AllocatorKind::ConcurrentHeap)]
fn heap_context_rejects_reset(#[case] kind: AllocatorKind) {
    let mut ctx =
        MemoryContext::from_config(&MemoryConfig::default().with_allocator(kind)).expect("context");
    let err = ctx.reset().unwrap_err();
    assert!(matches!(err, MemoryError::NotSupported { operation: "reset", .. }));
    assert_eq!(err.code(), "MEM:CAPABILITY:UNSUPPORTED");
}

#[test]
fn heap_context_reallocates() {
    let ctx = MemoryContext::new(HeapAllocator::debug());
    let p = ctx.malloc(4, 8).expect("alloc");
    // SAFETY: p is valid for 4 bytes.
    unsafe { p.as_ptr().copy_from_nonoverlapping([1u8, 2, 3, 4].as_ptr(), 4) };

    // SAFETY: p is live and from ctx.
    let q = unsafe { ctx.realloc(p.as_ptr(), 64, 32) }.expect("realloc");
    assert_eq!(q.as_ptr() as usize % 32, 0);
    // SAFETY: q is live with 64 bytes, the first 4 carried over.
    unsafe {
        assert_eq!(std::slice::from_raw_parts(q.as_ptr(), 4), &[1, 2, 3, 4]);
        assert_eq!(ctx.try_get_allocation_size(q.as_ptr()), Some(64));
        ctx.free(q.as_ptr()).expect("free");
    }
}

#[test]
fn shared_context_across_threads() {
    let ctx = Arc::new(SharedMemoryContext::shared(ConcurrentHeapAllocator::new()));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                for i in 0..200 {
                    let size = 8 + (t * 200 + i) % 128;
                    let p = ctx.malloc(size, 8).expect("alloc");
                    // SAFETY: p is live and from ctx.
                    unsafe {
                        assert_eq!(ctx.try_get_allocation_size(p.as_ptr()), Some(size));
                        ctx.free(p.as_ptr()).expect("free");
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }
}
