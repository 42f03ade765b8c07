//! A decorator raising the minimum alignment of every request.

use core::ptr::NonNull;

use crate::alloc::{DeallocateAll, OffsetAllocator, Owns, RawAllocator};
use crate::info::AllocatorInfo;

/// Forwards to `A`, raising the requested alignment of every call (and the
/// default alignment) to at least `MIN`.
///
/// `MIN` must be a power of two no greater than `A::MAX_ALIGNMENT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MinAlignedAllocator<A, const MIN: usize> {
    inner: A,
}

impl<A, const MIN: usize> MinAlignedAllocator<A, MIN> {
    /// Wraps `inner`.
    #[inline]
    pub const fn new(inner: A) -> Self {
        assert!(MIN.is_power_of_two());
        Self { inner }
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

unsafe impl<A: RawAllocator, const MIN: usize> RawAllocator for MinAlignedAllocator<A, MIN> {
    const DEFAULT_ALIGNMENT: usize = if A::DEFAULT_ALIGNMENT > MIN {
        A::DEFAULT_ALIGNMENT
    } else {
        MIN
    };
    const MAX_ALIGNMENT: usize = A::MAX_ALIGNMENT;

    #[inline]
    fn try_allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        self.inner.try_allocate(size, align.max(MIN))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        self.inner.deallocate(ptr, size)
    }

    #[inline]
    fn info(&self) -> AllocatorInfo {
        self.inner.info()
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

unsafe impl<A: OffsetAllocator, const MIN: usize> OffsetAllocator for MinAlignedAllocator<A, MIN> {
    #[inline]
    fn try_allocate_offset(
        &self,
        size: usize,
        align: usize,
        offset: usize,
    ) -> Option<NonNull<u8>> {
        self.inner.try_allocate_offset(size, align.max(MIN), offset)
    }
}

impl<A: DeallocateAll, const MIN: usize> DeallocateAll for MinAlignedAllocator<A, MIN> {
    #[inline]
    fn deallocate_all(&self) {
        self.inner.deallocate_all()
    }
}

impl<A: Owns, const MIN: usize> Owns for MinAlignedAllocator<A, MIN> {
    #[inline]
    fn owns(&self, ptr: *const u8) -> bool {
        self.inner.owns(ptr)
    }
}
