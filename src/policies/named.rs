//! Naming wrappers: override `info()` with a constant name and forward
//! everything else.

use core::ptr::NonNull;

use crate::alloc::{BlockAllocator, DeallocateAll, OffsetAllocator, Owns, RawAllocator};
use crate::block::MemoryBlock;
use crate::info::AllocatorInfo;

/// Gives a byte allocator a diagnostic name.
///
/// Carrying a name makes the wrapper stateful, so it never counts as
/// stateless even when `A` does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamedAllocator<A> {
    name: &'static str,
    inner: A,
}

impl<A> NamedAllocator<A> {
    /// Wraps `inner` under `name`.
    #[inline]
    pub const fn new(name: &'static str, inner: A) -> Self {
        Self { name, inner }
    }

    /// The diagnostic name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The wrapped allocator.
    #[inline]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Unwraps into the underlying allocator.
    #[inline]
    pub fn into_inner(self) -> A {
        self.inner
    }
}

unsafe impl<A: RawAllocator> RawAllocator for NamedAllocator<A> {
    const DEFAULT_ALIGNMENT: usize = A::DEFAULT_ALIGNMENT;
    const MAX_ALIGNMENT: usize = A::MAX_ALIGNMENT;

    #[inline]
    fn try_allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        self.inner.try_allocate(size, align)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        self.inner.deallocate(ptr, size)
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new(self.name, self as *const Self as *const ())
    }

    #[inline]
    fn max_size(&self) -> usize {
        self.inner.max_size()
    }

    #[inline]
    fn min_size(&self) -> usize {
        self.inner.min_size()
    }

    #[inline]
    fn recommended_allocation_size(&self, size: usize) -> usize {
        self.inner.recommended_allocation_size(size)
    }
}

unsafe impl<A: OffsetAllocator> OffsetAllocator for NamedAllocator<A> {
    #[inline]
    fn try_allocate_offset(
        &self,
        size: usize,
        align: usize,
        offset: usize,
    ) -> Option<NonNull<u8>> {
        self.inner.try_allocate_offset(size, align, offset)
    }
}

impl<A: DeallocateAll> DeallocateAll for NamedAllocator<A> {
    #[inline]
    fn deallocate_all(&self) {
        self.inner.deallocate_all()
    }
}

impl<A: Owns> Owns for NamedAllocator<A> {
    #[inline]
    fn owns(&self, ptr: *const u8) -> bool {
        self.inner.owns(ptr)
    }
}

/// Gives a block allocator a diagnostic name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamedBlockAllocator<B> {
    name: &'static str,
    inner: B,
}

impl<B> NamedBlockAllocator<B> {
    /// Wraps `inner` under `name`.
    #[inline]
    pub const fn new(name: &'static str, inner: B) -> Self {
        Self { name, inner }
    }

    /// The diagnostic name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The wrapped block allocator.
    #[inline]
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Unwraps into the underlying block allocator.
    #[inline]
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: BlockAllocator> BlockAllocator for NamedBlockAllocator<B> {
    #[inline]
    fn allocate_block(&self) -> Option<MemoryBlock> {
        self.inner.allocate_block()
    }

    #[inline]
    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        self.inner.deallocate_block(block)
    }

    #[inline]
    fn next_block_size(&self) -> usize {
        self.inner.next_block_size()
    }

    #[inline]
    fn next_block_alignment(&self) -> usize {
        self.inner.next_block_alignment()
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new(self.name, self as *const Self as *const ())
    }
}
