use compose_alloc::alloc::{DeallocateAll, Owns, RawAllocator};
use compose_alloc::allocators::PoolAllocator;
use compose_alloc::block::MemoryBlock;
use compose_alloc::block_allocators::block_storage;

#[test]
fn pool_round_trip() {
    let mut storage = block_storage::<64>();
    let block = MemoryBlock::from_slice(storage.as_uninit_slice());
    let pool = unsafe { PoolAllocator::new(16, block) };
    assert_eq!(pool.capacity(), 4);

    let mut ptrs = Vec::new();
    for _ in 0..4 {
        ptrs.push(pool.try_allocate(16, 8).unwrap());
    }
    assert!(pool.try_allocate(16, 8).is_none());

    let freed = ptrs[2];
    unsafe { pool.deallocate(freed, 16) };
    let again = pool.try_allocate(16, 8).unwrap();
    assert_eq!(again, freed);
}

#[test]
fn chunks_are_handed_out_in_ascending_address_order() {
    let mut storage = block_storage::<64>();
    let block = MemoryBlock::from_slice(storage.as_uninit_slice());
    let base = block.data();
    let pool = unsafe { PoolAllocator::new(16, block) };

    for index in 0..4 {
        let ptr = pool.try_allocate(8, 1).unwrap();
        assert_eq!(ptr.as_ptr(), base.wrapping_add(index * 16));
    }
}

#[test]
fn deallocate_all_rebuilds_the_freelist() {
    let mut storage = block_storage::<64>();
    let block = MemoryBlock::from_slice(storage.as_uninit_slice());
    let base = block.data();
    let pool = unsafe { PoolAllocator::new(16, block) };

    while pool.try_allocate(16, 1).is_some() {}
    pool.deallocate_all();

    let mut count = 0;
    let first = pool.try_allocate(16, 1).unwrap();
    assert_eq!(first.as_ptr(), base);
    count += 1;
    while pool.try_allocate(16, 1).is_some() {
        count += 1;
    }
    assert_eq!(count, 4);
}

#[test]
fn oversized_requests_fail_without_consuming_a_chunk() {
    let mut storage = block_storage::<64>();
    let block = MemoryBlock::from_slice(storage.as_uninit_slice());
    let pool = unsafe { PoolAllocator::new(16, block) };

    assert!(pool.try_allocate(17, 1).is_none());
    assert!(pool.try_allocate(12, 1).is_some());

    let mut remaining = 0;
    while pool.try_allocate(16, 1).is_some() {
        remaining += 1;
    }
    assert_eq!(remaining, 3);
}

#[test]
fn alignment_within_a_chunk() {
    let mut storage = block_storage::<512>();
    let block = MemoryBlock::from_slice(storage.as_uninit_slice());
    let pool = unsafe { PoolAllocator::new(256, block) };

    let ptr = pool.try_allocate(64, 128).unwrap();
    assert_eq!(ptr.as_ptr() as usize % 128, 0);
    unsafe { pool.deallocate(ptr, 64) };
    // The chunk itself is back, even though the pointer was interior.
    assert!(pool.try_allocate(256, 1).is_some());
}

#[test]
fn ownership_predicate_matches_the_block() {
    let mut storage = block_storage::<64>();
    let block = MemoryBlock::from_slice(storage.as_uninit_slice());
    let pool = unsafe { PoolAllocator::new(16, block) };

    let ptr = pool.try_allocate(8, 1).unwrap();
    assert!(pool.owns(ptr.as_ptr()));
    assert!(!pool.owns(core::ptr::null()));
    assert_eq!(pool.max_size(), 16);
}
