#![cfg(unix)]

use compose_alloc::alloc::BlockAllocator;
use compose_alloc::block_allocators::{GrowingVirtualBlockAllocator, VirtualBlockAllocator};
use compose_alloc::growth::{NoGrowth, PowerTwoGrowth};
use compose_alloc::region::page_size;

#[test]
fn growing_spans_double_until_the_reservation_runs_out() {
    let page = page_size();
    let alloc: GrowingVirtualBlockAllocator<PowerTwoGrowth> =
        GrowingVirtualBlockAllocator::with_growth(7, PowerTwoGrowth::new(3)).unwrap();

    let mut blocks = Vec::new();
    for expected in [page, 2 * page, 4 * page] {
        assert_eq!(alloc.next_block_size(), expected);
        let block = alloc.allocate_block().unwrap();
        assert_eq!(block.size(), expected);
        // The span is committed: both ends are writable.
        unsafe {
            block.data().write(0xA5);
            block.end().sub(1).write(0x5A);
        }
        blocks.push(block);
    }
    assert!(alloc.allocate_block().is_none());
    assert_eq!(alloc.next_block_size(), 0);

    for block in blocks {
        unsafe { alloc.deallocate_block(block) };
    }
    // Dropping the allocator releases the whole reservation.
}

#[test]
fn final_span_is_clamped_to_the_remaining_pages() {
    let page = page_size();
    let alloc: GrowingVirtualBlockAllocator<PowerTwoGrowth> =
        GrowingVirtualBlockAllocator::with_growth(4, PowerTwoGrowth::new(3)).unwrap();

    let sizes: Vec<usize> = core::iter::from_fn(|| alloc.allocate_block().map(|b| b.size()))
        .collect();
    assert_eq!(sizes, [page, 2 * page, page]);
    assert!(alloc.allocate_block().is_none());
}

#[test]
fn deallocated_spans_are_cached_for_reuse() {
    let alloc: VirtualBlockAllocator<NoGrowth> = VirtualBlockAllocator::new(2).unwrap();

    let b1 = alloc.allocate_block().unwrap();
    let first_data = b1.data();
    unsafe { alloc.deallocate_block(b1) };

    assert_eq!(alloc.next_block_size(), page_size());
    let b2 = alloc.allocate_block().unwrap();
    assert_eq!(b2.data(), first_data);

    // One fresh page remains after the cached one is back out.
    assert!(alloc.allocate_block().is_some());
    assert!(alloc.allocate_block().is_none());
}

#[test]
fn page_aligned_blocks() {
    let alloc: VirtualBlockAllocator<NoGrowth> = VirtualBlockAllocator::new(1).unwrap();
    assert_eq!(alloc.next_block_alignment(), page_size());
    let block = alloc.allocate_block().unwrap();
    assert_eq!(block.data() as usize % page_size(), 0);
    unsafe { alloc.deallocate_block(block) };
}
