//! Cross-cutting policies applied at block granularity.

use core::ptr::NonNull;

use lock_api::{Mutex, RawMutex};

use crate::alloc::BlockAllocator;
use crate::block::MemoryBlock;
use crate::info::AllocatorInfo;
use crate::policies::{MemoryTagger, MemoryTracker, NoTagger, NoTracker, NullLock};

struct PolicyState<B, Tag, Track> {
    alloc: B,
    tagger: Tag,
    tracker: Track,
}

/// Composes a block allocator with tagging, tracking and locking, the same
/// policies the arena applies to byte allocations.
///
/// Every operation runs under `Lock`. Produced blocks are tagged and
/// recorded whole; dropping the wrapper finalizes the tracker.
pub struct PolicyBlockAllocator<
    B: BlockAllocator,
    Tag: MemoryTagger = NoTagger,
    Track: MemoryTracker = NoTracker,
    Lock: RawMutex = NullLock,
> {
    state: Mutex<Lock, PolicyState<B, Tag, Track>>,
}

impl<B, Tag, Track, Lock> PolicyBlockAllocator<B, Tag, Track, Lock>
where
    B: BlockAllocator,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Lock: RawMutex,
{
    /// Creates a policy wrapper with default-constructed policies.
    pub fn new(alloc: B) -> Self
    where
        Tag: Default,
        Track: Default,
    {
        Self::with_policies(alloc, Tag::default(), Track::default())
    }

    /// Creates a policy wrapper from explicit policy instances.
    pub fn with_policies(alloc: B, tagger: Tag, tracker: Track) -> Self {
        Self {
            state: Mutex::new(PolicyState {
                alloc,
                tagger,
                tracker,
            }),
        }
    }

    /// Runs `f` against the tracker under the lock.
    pub fn with_tracker<R>(&self, f: impl FnOnce(&Track) -> R) -> R {
        f(&self.state.lock().tracker)
    }
}

impl<B, Tag, Track, Lock> BlockAllocator for PolicyBlockAllocator<B, Tag, Track, Lock>
where
    B: BlockAllocator,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Lock: RawMutex,
{
    fn allocate_block(&self) -> Option<MemoryBlock> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let align = state.alloc.next_block_alignment();
        let block = state.alloc.allocate_block()?;
        // SAFETY: the block was just produced and is exclusively ours
        // until returned to the caller.
        unsafe {
            let ptr = NonNull::new_unchecked(block.data());
            state.tagger.tag_allocation(ptr, block.size());
            state.tracker.on_allocate(ptr, block.size(), align);
        }
        Some(block)
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let info = state.alloc.info();
        let ptr = NonNull::new_unchecked(block.data());
        state.tagger.tag_deallocation(ptr, block.size());
        state.tracker.on_deallocate(&info, ptr, block.size());
        state.alloc.deallocate_block(block);
    }

    fn next_block_size(&self) -> usize {
        self.state.lock().alloc.next_block_size()
    }

    fn next_block_alignment(&self) -> usize {
        self.state.lock().alloc.next_block_alignment()
    }

    fn info(&self) -> AllocatorInfo {
        self.state.lock().alloc.info()
    }
}

impl<B, Tag, Track, Lock> Drop for PolicyBlockAllocator<B, Tag, Track, Lock>
where
    B: BlockAllocator,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Lock: RawMutex,
{
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let info = state.alloc.info();
        state.tracker.finalize(&info);
    }
}
