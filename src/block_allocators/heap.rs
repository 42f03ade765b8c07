//! Block allocators backed by the process heap.
//!
//! The fixed-size variants are zero-sized and stateless: the block size is
//! a compile-time constant, so any instance can free any block. Dynamic
//! sizes are covered by the growing variants, which combine a runtime base
//! size with a growth multiplier (use [`NoGrowth`] for a constant size).

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use crate::alloc::{BlockAllocator, Stateless};
use crate::block::MemoryBlock;
use crate::growth::{GrowthMultiplier, NoGrowth};
use crate::info::AllocatorInfo;
use crate::pointer::FUNDAMENTAL_ALIGNMENT;

fn heap_allocate(size: usize, align: usize) -> Option<MemoryBlock> {
    if size == 0 {
        return None;
    }
    let layout = Layout::from_size_align(size, align).ok()?;
    // SAFETY: layout has non-zero size.
    let ptr = NonNull::new(unsafe { alloc_crate::alloc::alloc(layout) })?;
    Some(MemoryBlock::new(ptr, size))
}

unsafe fn heap_deallocate(block: MemoryBlock, align: usize) {
    debug_assert!(!block.is_null());
    let layout = Layout::from_size_align_unchecked(block.size(), align);
    alloc_crate::alloc::dealloc(block.data(), layout);
}

/// Allocates one `SIZE`-byte block per request from the global heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapBlockAllocator<const SIZE: usize>;

impl<const SIZE: usize> BlockAllocator for HeapBlockAllocator<SIZE> {
    fn allocate_block(&self) -> Option<MemoryBlock> {
        heap_allocate(SIZE, FUNDAMENTAL_ALIGNMENT)
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        debug_assert_eq!(block.size(), SIZE);
        heap_deallocate(block, FUNDAMENTAL_ALIGNMENT);
    }

    fn next_block_size(&self) -> usize {
        SIZE
    }

    fn next_block_alignment(&self) -> usize {
        FUNDAMENTAL_ALIGNMENT
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new("heap-block", self as *const Self as *const ())
    }
}

unsafe impl<const SIZE: usize> Stateless for HeapBlockAllocator<SIZE> {}

/// Allocates `SIZE`-byte blocks aligned to the power-of-two `ALIGN`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlignedBlockAllocator<const SIZE: usize, const ALIGN: usize>;

impl<const SIZE: usize, const ALIGN: usize> BlockAllocator for AlignedBlockAllocator<SIZE, ALIGN> {
    fn allocate_block(&self) -> Option<MemoryBlock> {
        debug_assert!(ALIGN.is_power_of_two());
        heap_allocate(SIZE, ALIGN)
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        debug_assert_eq!(block.size(), SIZE);
        heap_deallocate(block, ALIGN);
    }

    fn next_block_size(&self) -> usize {
        SIZE
    }

    fn next_block_alignment(&self) -> usize {
        ALIGN
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new("aligned-block", self as *const Self as *const ())
    }
}

unsafe impl<const SIZE: usize, const ALIGN: usize> Stateless for AlignedBlockAllocator<SIZE, ALIGN> {}

/// Allocates `SIZE`-byte blocks with `libc::malloc`.
#[cfg(all(feature = "std", unix))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MallocBlockAllocator<const SIZE: usize>;

#[cfg(all(feature = "std", unix))]
impl<const SIZE: usize> BlockAllocator for MallocBlockAllocator<SIZE> {
    fn allocate_block(&self) -> Option<MemoryBlock> {
        if SIZE == 0 {
            return None;
        }
        // SAFETY: plain malloc; null is handled below.
        let ptr = NonNull::new(unsafe { libc::malloc(SIZE) })?;
        Some(MemoryBlock::new(ptr.cast(), SIZE))
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        debug_assert_eq!(block.size(), SIZE);
        libc::free(block.data().cast());
    }

    fn next_block_size(&self) -> usize {
        SIZE
    }

    fn next_block_alignment(&self) -> usize {
        FUNDAMENTAL_ALIGNMENT
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new("malloc-block", self as *const Self as *const ())
    }
}

#[cfg(all(feature = "std", unix))]
unsafe impl<const SIZE: usize> Stateless for MallocBlockAllocator<SIZE> {}

/// Heap blocks of `base_size * multiplier` bytes, growing after each
/// successful allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrowingHeapBlockAllocator<G: GrowthMultiplier = NoGrowth> {
    base_size: usize,
    growth: Cell<G>,
}

impl<G: GrowthMultiplier> GrowingHeapBlockAllocator<G> {
    /// Creates an allocator of `base_size`-byte blocks scaled by `growth`.
    pub const fn new(base_size: usize, growth: G) -> Self {
        Self {
            base_size,
            growth: Cell::new(growth),
        }
    }
}

impl<G: GrowthMultiplier> BlockAllocator for GrowingHeapBlockAllocator<G> {
    fn allocate_block(&self) -> Option<MemoryBlock> {
        let mut growth = self.growth.get();
        let size = self.base_size.checked_mul(growth.multiplier())?;
        let block = heap_allocate(size, FUNDAMENTAL_ALIGNMENT)?;
        growth.grow();
        self.growth.set(growth);
        Some(block)
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        heap_deallocate(block, FUNDAMENTAL_ALIGNMENT);
    }

    fn next_block_size(&self) -> usize {
        self.base_size
            .saturating_mul(self.growth.get().multiplier())
    }

    fn next_block_alignment(&self) -> usize {
        FUNDAMENTAL_ALIGNMENT
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new("growing-heap-block", self as *const Self as *const ())
    }
}

/// Growing heap blocks aligned to the power-of-two `ALIGN`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrowingAlignedBlockAllocator<G: GrowthMultiplier, const ALIGN: usize> {
    base_size: usize,
    growth: Cell<G>,
}

impl<G: GrowthMultiplier, const ALIGN: usize> GrowingAlignedBlockAllocator<G, ALIGN> {
    /// Creates an allocator of `base_size`-byte aligned blocks scaled by
    /// `growth`.
    pub const fn new(base_size: usize, growth: G) -> Self {
        assert!(ALIGN.is_power_of_two());
        Self {
            base_size,
            growth: Cell::new(growth),
        }
    }
}

impl<G: GrowthMultiplier, const ALIGN: usize> BlockAllocator
    for GrowingAlignedBlockAllocator<G, ALIGN>
{
    fn allocate_block(&self) -> Option<MemoryBlock> {
        let mut growth = self.growth.get();
        let size = self.base_size.checked_mul(growth.multiplier())?;
        let block = heap_allocate(size, ALIGN)?;
        growth.grow();
        self.growth.set(growth);
        Some(block)
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        heap_deallocate(block, ALIGN);
    }

    fn next_block_size(&self) -> usize {
        self.base_size
            .saturating_mul(self.growth.get().multiplier())
    }

    fn next_block_alignment(&self) -> usize {
        ALIGN
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new("growing-aligned-block", self as *const Self as *const ())
    }
}

/// Growing blocks from `libc::malloc`.
#[cfg(all(feature = "std", unix))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrowingMallocBlockAllocator<G: GrowthMultiplier = NoGrowth> {
    base_size: usize,
    growth: Cell<G>,
}

#[cfg(all(feature = "std", unix))]
impl<G: GrowthMultiplier> GrowingMallocBlockAllocator<G> {
    /// Creates an allocator of `base_size`-byte blocks scaled by `growth`.
    pub const fn new(base_size: usize, growth: G) -> Self {
        Self {
            base_size,
            growth: Cell::new(growth),
        }
    }
}

#[cfg(all(feature = "std", unix))]
impl<G: GrowthMultiplier> BlockAllocator for GrowingMallocBlockAllocator<G> {
    fn allocate_block(&self) -> Option<MemoryBlock> {
        let mut growth = self.growth.get();
        let size = self.base_size.checked_mul(growth.multiplier())?;
        if size == 0 {
            return None;
        }
        // SAFETY: plain malloc; null is handled below.
        let ptr = NonNull::new(unsafe { libc::malloc(size) })?;
        growth.grow();
        self.growth.set(growth);
        Some(MemoryBlock::new(ptr.cast(), size))
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        libc::free(block.data().cast());
    }

    fn next_block_size(&self) -> usize {
        self.base_size
            .saturating_mul(self.growth.get().multiplier())
    }

    fn next_block_alignment(&self) -> usize {
        FUNDAMENTAL_ALIGNMENT
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new("growing-malloc-block", self as *const Self as *const ())
    }
}
