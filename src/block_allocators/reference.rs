//! A type-erased block-allocator reference.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::alloc::{BlockAllocator, Stateless};
use crate::block::MemoryBlock;
use crate::info::AllocatorInfo;

struct BlockAllocatorVtable {
    allocate_block: unsafe fn(NonNull<()>) -> Option<MemoryBlock>,
    deallocate_block: unsafe fn(NonNull<()>, MemoryBlock),
    next_block_size: unsafe fn(NonNull<()>) -> usize,
    next_block_alignment: unsafe fn(NonNull<()>) -> usize,
    info: unsafe fn(NonNull<()>) -> AllocatorInfo,
}

struct VtableFor<B>(PhantomData<B>);

impl<B: BlockAllocator> VtableFor<B> {
    const VTABLE: &'static BlockAllocatorVtable = &BlockAllocatorVtable {
        allocate_block: Self::allocate_block,
        deallocate_block: Self::deallocate_block,
        next_block_size: Self::next_block_size,
        next_block_alignment: Self::next_block_alignment,
        info: Self::info,
    };

    unsafe fn allocate_block(data: NonNull<()>) -> Option<MemoryBlock> {
        data.cast::<B>().as_ref().allocate_block()
    }

    unsafe fn deallocate_block(data: NonNull<()>, block: MemoryBlock) {
        data.cast::<B>().as_ref().deallocate_block(block)
    }

    unsafe fn next_block_size(data: NonNull<()>) -> usize {
        data.cast::<B>().as_ref().next_block_size()
    }

    unsafe fn next_block_alignment(data: NonNull<()>) -> usize {
        data.cast::<B>().as_ref().next_block_alignment()
    }

    unsafe fn info(data: NonNull<()>) -> AllocatorInfo {
        data.cast::<B>().as_ref().info()
    }
}

struct StatelessVtableFor<B>(PhantomData<B>);

impl<B: BlockAllocator + Stateless> StatelessVtableFor<B> {
    const VTABLE: &'static BlockAllocatorVtable = &BlockAllocatorVtable {
        allocate_block: Self::allocate_block,
        deallocate_block: Self::deallocate_block,
        next_block_size: Self::next_block_size,
        next_block_alignment: Self::next_block_alignment,
        info: Self::info,
    };

    unsafe fn allocate_block(_data: NonNull<()>) -> Option<MemoryBlock> {
        B::default().allocate_block()
    }

    unsafe fn deallocate_block(_data: NonNull<()>, block: MemoryBlock) {
        B::default().deallocate_block(block)
    }

    unsafe fn next_block_size(_data: NonNull<()>) -> usize {
        B::default().next_block_size()
    }

    unsafe fn next_block_alignment(_data: NonNull<()>) -> usize {
        B::default().next_block_alignment()
    }

    unsafe fn info(_data: NonNull<()>) -> AllocatorInfo {
        B::default().info()
    }
}

/// A `(data, vtable)` view over any concrete block allocator.
///
/// References created by [`stateless`](Self::stateless) carry no data
/// pointer at all; they materialize the allocator on demand, so their
/// equality is independent of any instance address.
pub struct BlockAllocatorRef<'a> {
    data: NonNull<()>,
    vtable: &'static BlockAllocatorVtable,
    _marker: PhantomData<&'a ()>,
}

impl<'a> BlockAllocatorRef<'a> {
    /// Erases `alloc` into a reference-sized handle.
    pub fn new<B: BlockAllocator>(alloc: &'a B) -> Self {
        Self {
            data: NonNull::from(alloc).cast(),
            vtable: VtableFor::<B>::VTABLE,
            _marker: PhantomData,
        }
    }

    /// Synthesizes a reference to the stateless block allocator `B`,
    /// constructing an instance on demand for each call.
    pub fn stateless<B: BlockAllocator + Stateless>() -> BlockAllocatorRef<'static> {
        BlockAllocatorRef {
            data: NonNull::dangling(),
            vtable: StatelessVtableFor::<B>::VTABLE,
            _marker: PhantomData,
        }
    }
}

impl BlockAllocator for BlockAllocatorRef<'_> {
    #[inline]
    fn allocate_block(&self) -> Option<MemoryBlock> {
        // SAFETY: data points to a live B for 'a (or is unused by a
        // stateless vtable).
        unsafe { (self.vtable.allocate_block)(self.data) }
    }

    #[inline]
    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        (self.vtable.deallocate_block)(self.data, block)
    }

    #[inline]
    fn next_block_size(&self) -> usize {
        // SAFETY: as above.
        unsafe { (self.vtable.next_block_size)(self.data) }
    }

    #[inline]
    fn next_block_alignment(&self) -> usize {
        // SAFETY: as above.
        unsafe { (self.vtable.next_block_alignment)(self.data) }
    }

    #[inline]
    fn info(&self) -> AllocatorInfo {
        // SAFETY: as above.
        unsafe { (self.vtable.info)(self.data) }
    }
}

impl Clone for BlockAllocatorRef<'_> {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for BlockAllocatorRef<'_> {}

impl PartialEq for BlockAllocatorRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && core::ptr::eq(self.vtable, other.vtable)
    }
}

impl Eq for BlockAllocatorRef<'_> {}

impl fmt::Debug for BlockAllocatorRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockAllocatorRef")
            .field("info", &self.info())
            .finish_non_exhaustive()
    }
}
