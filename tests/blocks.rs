use core::cell::Cell;

use compose_alloc::alloc::{BlockAllocator, RawAllocator};
use compose_alloc::allocators::BumpUpAllocator;
use compose_alloc::block::MemoryBlock;
use compose_alloc::block_allocators::{
    block_storage, AlignedBlockAllocator, BlockAllocatorRef, CachedBlockAllocator,
    GrowingHeapBlockAllocator, HeapBlockAllocator, NullBlockAllocator, PolicyBlockAllocator,
    StackBlockAllocator,
};
use compose_alloc::growth::{NoGrowth, PowerTwoGrowth};
use compose_alloc::policies::{
    CountingTracker, NamedAllocator, NamedBlockAllocator, PatternTagger, ALLOCATED_FILL,
};

struct CountingBlockAllocator<B> {
    inner: B,
    allocations: Cell<usize>,
}

impl<B: BlockAllocator> CountingBlockAllocator<B> {
    fn new(inner: B) -> Self {
        Self {
            inner,
            allocations: Cell::new(0),
        }
    }
}

impl<B: BlockAllocator> BlockAllocator for CountingBlockAllocator<B> {
    fn allocate_block(&self) -> Option<MemoryBlock> {
        let block = self.inner.allocate_block()?;
        self.allocations.set(self.allocations.get() + 1);
        Some(block)
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        self.inner.deallocate_block(block)
    }

    fn next_block_size(&self) -> usize {
        self.inner.next_block_size()
    }
}

#[test]
fn cached_blocks_are_reused_byte_identical() {
    let cached = CachedBlockAllocator::new(CountingBlockAllocator::new(HeapBlockAllocator::<1024>));

    let b1 = cached.allocate_block().unwrap();
    unsafe { cached.deallocate_block(b1) };
    assert_eq!(cached.cached_blocks(), 1);
    assert_eq!(cached.next_block_size(), 1024);

    let b2 = cached.allocate_block().unwrap();
    assert_eq!(b2.data(), b1.data());
    assert_eq!(b2.size(), b1.size());
    assert_eq!(cached.inner().allocations.get(), 1);

    unsafe { cached.deallocate_block(b2) };
}

#[test]
fn null_allocator_produces_nothing() {
    let null = NullBlockAllocator;
    assert!(null.allocate_block().is_none());
    assert_eq!(null.next_block_size(), 0);
    assert_eq!(null.info().name(), "null-block");
}

#[test]
fn heap_blocks_round_trip() {
    let heap = HeapBlockAllocator::<256>;
    let block = heap.allocate_block().unwrap();
    assert_eq!(block.size(), 256);
    assert_eq!(block.data() as usize % heap.next_block_alignment(), 0);
    unsafe {
        block.data().write(0x42);
        heap.deallocate_block(block);
    }
}

#[test]
fn aligned_blocks_respect_the_boundary() {
    let aligned = AlignedBlockAllocator::<4096, 4096>;
    let block = aligned.allocate_block().unwrap();
    assert_eq!(block.data() as usize % 4096, 0);
    unsafe { aligned.deallocate_block(block) };
}

#[test]
fn growing_heap_blocks_scale_with_the_multiplier() {
    let growing = GrowingHeapBlockAllocator::new(512, PowerTwoGrowth::new(2));

    assert_eq!(growing.next_block_size(), 512);
    let sizes: Vec<usize> = (0..4)
        .map(|_| {
            let block = growing.allocate_block().unwrap();
            let size = block.size();
            unsafe { growing.deallocate_block(block) };
            size
        })
        .collect();
    assert_eq!(sizes, [512, 1024, 2048, 2048]);
}

#[test]
fn growing_with_no_growth_is_a_dynamic_fixed_size() {
    let fixed = GrowingHeapBlockAllocator::new(300, NoGrowth);
    let block = fixed.allocate_block().unwrap();
    assert_eq!(block.size(), 300);
    unsafe { fixed.deallocate_block(block) };
    assert_eq!(fixed.next_block_size(), 300);
}

#[test]
fn stack_blocks_come_from_the_borrowed_buffer() {
    let mut storage = block_storage::<256>();
    let range = {
        let slice = storage.as_uninit_slice();
        let start = slice.as_ptr() as usize;
        start..start + slice.len()
    };
    let stack = StackBlockAllocator::new(storage.as_uninit_slice(), 64);
    assert_eq!(stack.capacity(), 4);

    let mut blocks = Vec::new();
    for _ in 0..4 {
        let block = stack.allocate_block().unwrap();
        assert!(range.contains(&(block.data() as usize)));
        assert_eq!(block.size(), 64);
        blocks.push(block);
    }
    assert!(stack.allocate_block().is_none());
    assert_eq!(stack.next_block_size(), 0);

    for block in blocks {
        unsafe { stack.deallocate_block(block) };
    }
    assert_eq!(stack.next_block_size(), 64);
}

#[test]
fn stack_blocks_feed_a_bump_allocator() {
    let mut storage = block_storage::<256>();
    let stack = StackBlockAllocator::new(storage.as_uninit_slice(), 128);

    let block = stack.allocate_block().unwrap();
    let bump = unsafe { BumpUpAllocator::new(block) };
    assert!(bump.try_allocate(96, 8).is_some());
    drop(bump);
    unsafe { stack.deallocate_block(block) };
}

#[test]
fn named_wrappers_override_info() {
    let named = NamedBlockAllocator::new("frame-source", HeapBlockAllocator::<256>);
    assert_eq!(named.info().name(), "frame-source");

    let mut storage = block_storage::<64>();
    let block = MemoryBlock::from_slice(storage.as_uninit_slice());
    let named = NamedAllocator::new("scratch", unsafe { BumpUpAllocator::new(block) });
    assert_eq!(named.info().name(), "scratch");
    assert!(named.try_allocate(16, 8).is_some());
}

#[test]
fn stateless_references_are_interchangeable() {
    let r1 = BlockAllocatorRef::stateless::<HeapBlockAllocator<256>>();
    let r2 = BlockAllocatorRef::stateless::<HeapBlockAllocator<256>>();
    assert_eq!(r1, r2);
    assert_eq!(r1.next_block_size(), 256);

    let block = r1.allocate_block().unwrap();
    // Any equal reference may free the block.
    unsafe { r2.deallocate_block(block) };
}

#[test]
fn erased_references_track_their_instance() {
    let a = HeapBlockAllocator::<256>;
    let b = HeapBlockAllocator::<256>;
    let ra = BlockAllocatorRef::new(&a);
    let rb = BlockAllocatorRef::new(&b);
    assert_ne!(ra, rb);
    assert_eq!(ra, BlockAllocatorRef::new(&a));

    let block = ra.allocate_block().unwrap();
    unsafe { rb.deallocate_block(block) };
}

#[test]
fn policy_wrapper_tags_and_tracks_blocks() {
    let policy: PolicyBlockAllocator<_, PatternTagger, CountingTracker> =
        PolicyBlockAllocator::new(HeapBlockAllocator::<128>);

    let block = policy.allocate_block().unwrap();
    assert_eq!(unsafe { block.data().read() }, ALLOCATED_FILL);
    policy.with_tracker(|t| {
        assert_eq!(t.allocations(), 1);
        assert_eq!(t.bytes_in_use(), 128);
    });

    unsafe { policy.deallocate_block(block) };
    policy.with_tracker(|t| assert_eq!(t.allocations(), 0));
}

#[cfg(unix)]
mod unix_only {
    use super::*;
    use compose_alloc::block_allocators::{MallocBlockAllocator, ThreadLocalBlockAllocator};

    #[test]
    fn malloc_blocks_round_trip() {
        let malloc = MallocBlockAllocator::<512>;
        let block = malloc.allocate_block().unwrap();
        assert_eq!(block.size(), 512);
        unsafe {
            block.data().write(0x13);
            malloc.deallocate_block(block);
        }
    }

    #[test]
    fn thread_local_storage_is_per_thread() {
        let alloc = ThreadLocalBlockAllocator::<64, 4>;

        let mut blocks = Vec::new();
        for _ in 0..4 {
            blocks.push(alloc.allocate_block().unwrap());
        }
        assert!(alloc.allocate_block().is_none());
        for block in blocks.drain(..) {
            unsafe { alloc.deallocate_block(block) };
        }

        std::thread::spawn(|| {
            let alloc = ThreadLocalBlockAllocator::<64, 4>;
            // A fresh thread gets its own storage.
            assert!(alloc.allocate_block().is_some());
        })
        .join()
        .unwrap();
    }
}
