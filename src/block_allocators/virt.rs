//! Block allocation out of a virtual-memory reservation.

use core::cell::{Cell, RefCell};

use std::io;

use crate::alloc::BlockAllocator;
use crate::block::MemoryBlock;
use crate::cache::MemoryBlockCache;
use crate::growth::{GrowthMultiplier, NoGrowth, UncappedPowerTwoGrowth};
use crate::info::AllocatorInfo;
use crate::region::{page_size, VirtualMemory};

/// Commits pages on demand out of an up-front reservation.
///
/// Each allocation commits a span of `multiplier` pages (clamped to what is
/// left of the reservation) and advances the active page; the multiplier
/// grows after every fresh commit, so successive blocks can cover larger
/// spans. Returned blocks are cached for reuse rather than decommitted;
/// the whole reservation is released when the allocator is dropped. Once
/// the reservation is used up and the cache is empty, allocation yields
/// `None`.
#[derive(Debug)]
pub struct VirtualBlockAllocator<G: GrowthMultiplier = NoGrowth> {
    memory: VirtualMemory,
    active_page: Cell<usize>,
    cache: RefCell<MemoryBlockCache>,
    growth: Cell<G>,
}

impl<G: GrowthMultiplier + Default> VirtualBlockAllocator<G> {
    /// Reserves `pages` pages with a default-constructed growth policy.
    pub fn new(pages: usize) -> io::Result<Self> {
        Self::with_growth(pages, G::default())
    }
}

impl<G: GrowthMultiplier> VirtualBlockAllocator<G> {
    /// Reserves `pages` pages scaled by `growth`.
    pub fn with_growth(pages: usize, growth: G) -> io::Result<Self> {
        Ok(Self {
            memory: VirtualMemory::reserve(pages)?,
            active_page: Cell::new(0),
            cache: RefCell::new(MemoryBlockCache::new()),
            growth: Cell::new(growth),
        })
    }

    /// Pages not yet handed out (ignoring the cache).
    #[inline]
    pub fn remaining_pages(&self) -> usize {
        self.memory.pages() - self.active_page.get()
    }
}

impl<G: GrowthMultiplier> BlockAllocator for VirtualBlockAllocator<G> {
    fn allocate_block(&self) -> Option<MemoryBlock> {
        if let Some(block) = self.cache.borrow_mut().request_block() {
            return Some(block);
        }
        let remaining = self.remaining_pages();
        if remaining == 0 {
            return None;
        }
        let mut growth = self.growth.get();
        let span = growth.multiplier().min(remaining);
        let active = self.active_page.get();
        let base = self.memory.commit(active, span).ok()?;
        growth.grow();
        self.growth.set(growth);
        self.active_page.set(active + span);
        Some(MemoryBlock::new(base, span * page_size()))
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        debug_assert!(self.memory.at(0) <= block.data() && block.end() <= self.memory.at(self.memory.pages()));
        // Committed pages are cached for reuse; decommit happens wholesale
        // when the reservation is released.
        self.cache.borrow_mut().store_block(block);
    }

    fn next_block_size(&self) -> usize {
        if let Some(block) = self.cache.borrow().peek() {
            return block.size();
        }
        let remaining = self.remaining_pages();
        if remaining == 0 {
            0
        } else {
            self.growth.get().multiplier().min(remaining) * page_size()
        }
    }

    fn next_block_alignment(&self) -> usize {
        page_size()
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new("virtual-block", self as *const Self as *const ())
    }
}

/// A virtual block allocator whose spans double with each commit.
pub type GrowingVirtualBlockAllocator<G = UncappedPowerTwoGrowth> = VirtualBlockAllocator<G>;
