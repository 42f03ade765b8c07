//! Bridges an allocator storage to the `allocator_api2::alloc::Allocator`
//! interface, so composed allocators can back generic container code.

use core::alloc::Layout;
use core::ptr::NonNull;

use allocator_api2::alloc::{AllocError, Allocator};

use crate::alloc::RawAllocator;
use crate::storage::AllocatorStorage;

/// Exposes the allocator behind `S` through the standard `Allocator`
/// interface.
///
/// Zero-sized requests are answered with a dangling, suitably aligned
/// pointer without touching the underlying allocator; equality and cloning
/// follow the storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandardAllocator<S: AllocatorStorage> {
    storage: S,
}

impl<S: AllocatorStorage> StandardAllocator<S> {
    /// Wraps `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The underlying storage.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Largest request the underlying allocator could satisfy.
    pub fn max_size(&self) -> usize {
        self.storage.allocator().max_size()
    }
}

#[inline]
fn layout_dangling(layout: Layout) -> NonNull<u8> {
    // SAFETY: layout alignments are guaranteed to be non-zero.
    unsafe { NonNull::new_unchecked(layout.align() as *mut u8) }
}

unsafe impl<S: AllocatorStorage> Allocator for StandardAllocator<S> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            return Ok(NonNull::slice_from_raw_parts(layout_dangling(layout), 0));
        }
        let ptr = self
            .storage
            .allocator()
            .try_allocate(layout.size(), layout.align())
            .ok_or(AllocError)?;
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() > 0 {
            self.storage.allocator().deallocate(ptr, layout.size());
        }
    }
}
