//! LIFO reuse of deallocated blocks.

use core::cell::RefCell;

use crate::alloc::BlockAllocator;
use crate::block::MemoryBlock;
use crate::cache::MemoryBlockCache;
use crate::info::AllocatorInfo;

/// Wraps a block allocator and keeps deallocated blocks for reuse.
///
/// `allocate_block` prefers the most recently returned block over calling
/// through to `B`; on drop, every cached block is handed back to `B`.
/// Cached blocks must satisfy the [`MemoryBlockCache`] storage
/// requirements (pointer-aligned, at least two words), which every block
/// source in this crate does.
#[derive(Debug)]
pub struct CachedBlockAllocator<B: BlockAllocator> {
    inner: B,
    cache: RefCell<MemoryBlockCache>,
}

impl<B: BlockAllocator> CachedBlockAllocator<B> {
    /// Wraps `inner` with an empty cache.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            cache: RefCell::new(MemoryBlockCache::new()),
        }
    }

    /// The wrapped block allocator.
    #[inline]
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Number of blocks currently held for reuse.
    pub fn cached_blocks(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<B: BlockAllocator> BlockAllocator for CachedBlockAllocator<B> {
    fn allocate_block(&self) -> Option<MemoryBlock> {
        if let Some(block) = self.cache.borrow_mut().request_block() {
            return Some(block);
        }
        self.inner.allocate_block()
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        self.cache.borrow_mut().store_block(block);
    }

    fn next_block_size(&self) -> usize {
        if let Some(block) = self.cache.borrow().peek() {
            block.size()
        } else {
            self.inner.next_block_size()
        }
    }

    fn next_block_alignment(&self) -> usize {
        self.inner.next_block_alignment()
    }

    fn info(&self) -> AllocatorInfo {
        self.inner.info()
    }
}

impl<B: BlockAllocator> Drop for CachedBlockAllocator<B> {
    fn drop(&mut self) {
        let cache = self.cache.get_mut();
        while let Some(block) = cache.request_block() {
            // SAFETY: every cached block originated from `inner`.
            unsafe { self.inner.deallocate_block(block) };
        }
    }
}
