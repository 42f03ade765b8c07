//! A type-erased allocator reference.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::alloc::RawAllocator;
use crate::info::AllocatorInfo;

struct AllocatorVtable {
    try_allocate: unsafe fn(NonNull<()>, usize, usize) -> Option<NonNull<u8>>,
    allocate: unsafe fn(NonNull<()>, usize, usize) -> NonNull<u8>,
    deallocate: unsafe fn(NonNull<()>, NonNull<u8>, usize),
    info: unsafe fn(NonNull<()>) -> AllocatorInfo,
}

struct VtableFor<A>(PhantomData<A>);

impl<A: RawAllocator> VtableFor<A> {
    const VTABLE: &'static AllocatorVtable = &AllocatorVtable {
        try_allocate: Self::try_allocate,
        allocate: Self::allocate,
        deallocate: Self::deallocate,
        info: Self::info,
    };

    unsafe fn try_allocate(data: NonNull<()>, size: usize, align: usize) -> Option<NonNull<u8>> {
        data.cast::<A>().as_ref().try_allocate(size, align)
    }

    unsafe fn allocate(data: NonNull<()>, size: usize, align: usize) -> NonNull<u8> {
        data.cast::<A>().as_ref().allocate(size, align)
    }

    unsafe fn deallocate(data: NonNull<()>, ptr: NonNull<u8>, size: usize) {
        data.cast::<A>().as_ref().deallocate(ptr, size)
    }

    unsafe fn info(data: NonNull<()>) -> AllocatorInfo {
        data.cast::<A>().as_ref().info()
    }
}

/// A `(data, vtable)` view over any concrete allocator.
///
/// Erasure keeps only the four core entry points; the static capabilities
/// of the concrete type (statelessness, ownership queries, truncation) are
/// dropped. Two references compare equal when they view the same instance.
pub struct AnyAllocatorRef<'a> {
    data: NonNull<()>,
    vtable: &'static AllocatorVtable,
    _marker: PhantomData<&'a ()>,
}

impl<'a> AnyAllocatorRef<'a> {
    /// Erases `alloc` into a reference-sized handle.
    pub fn new<A: RawAllocator>(alloc: &'a A) -> Self {
        Self {
            data: NonNull::from(alloc).cast(),
            vtable: VtableFor::<A>::VTABLE,
            _marker: PhantomData,
        }
    }
}

unsafe impl RawAllocator for AnyAllocatorRef<'_> {
    #[inline]
    fn try_allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        // SAFETY: data points to a live A for 'a, per construction.
        unsafe { (self.vtable.try_allocate)(self.data, size, align) }
    }

    #[inline]
    fn allocate(&self, size: usize, align: usize) -> NonNull<u8> {
        // SAFETY: as above.
        unsafe { (self.vtable.allocate)(self.data, size, align) }
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        (self.vtable.deallocate)(self.data, ptr, size)
    }

    #[inline]
    fn info(&self) -> AllocatorInfo {
        // SAFETY: as above.
        unsafe { (self.vtable.info)(self.data) }
    }
}

impl Clone for AnyAllocatorRef<'_> {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for AnyAllocatorRef<'_> {}

impl PartialEq for AnyAllocatorRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && core::ptr::eq(self.vtable, other.vtable)
    }
}

impl Eq for AnyAllocatorRef<'_> {}

impl fmt::Debug for AnyAllocatorRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyAllocatorRef")
            .field("info", &self.info())
            .finish_non_exhaustive()
    }
}
