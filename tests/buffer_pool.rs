use otto_core::audio::{BufferHandle, BufferPool};

#[test]
fn eight_slots_of_sixty_four_frames_all_allocate() {
    let pool = BufferPool::with_capacity(8, 64);
    let handles: Vec<BufferHandle<'_>> = (0..8).map(|_| pool.allocate()).collect();

    assert_eq!(pool.in_use(), 8);
    assert!(handles.iter().all(|h| h.len() == 64));
    assert_eq!(pool.high_water_mark(), 8);
}

#[test]
#[should_panic(expected = "buffer pool exhausted")]
fn ninth_allocation_panics() {
    let pool = BufferPool::with_capacity(8, 64);
    let _held: Vec<BufferHandle<'_>> = (0..8).map(|_| pool.allocate()).collect();
    let _ = pool.allocate();
}

#[test]
fn live_handles_never_alias() {
    let pool = BufferPool::with_capacity(8, 64);
    let mut live: Vec<BufferHandle<'_>> = Vec::new();

    // Churn through allocations and releases, tagging each live slot with a
    // unique value. Any aliasing would overwrite another handle's tag.
    for round in 0..64u32 {
        if live.len() == 8 || (round % 3 == 2 && !live.is_empty()) {
            let victim = (round as usize * 5) % live.len();
            live.swap_remove(victim);
        }
        let handle = pool.allocate();
        handle.fill(round as f32);
        live.push(handle);

        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                assert!(!a.shares_slot_with(b), "two live handles share a slot");
            }
        }
        for handle in &live {
            let tag = handle.get(0);
            assert!(handle.iter().all(|s| s == tag), "slot contents were clobbered");
        }
    }

    assert_eq!(pool.in_use(), live.len());
}

#[test]
fn counts_follow_clone_slice_and_release() {
    let pool = BufferPool::with_capacity(2, 16);
    let handle = pool.allocate();
    let copy = handle.clone();
    let head = handle.slice(0, 8);
    assert_eq!(handle.reference_count(), 3);

    drop(copy);
    drop(head);
    assert_eq!(handle.reference_count(), 1);

    let mut handle = handle;
    handle.release();
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn released_slot_is_reused_within_block() {
    let pool = BufferPool::with_capacity(2, 16);
    let first = pool.allocate();
    let mut scratch = pool.allocate();
    let scratch_ptr = scratch.as_ptr();

    scratch.release();
    let reused = pool.allocate();

    assert_eq!(reused.as_ptr(), scratch_ptr);
    assert!(!reused.shares_slot_with(&first));
}
