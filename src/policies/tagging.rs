//! Memory taggers: fill patterns written over allocated and deallocated
//! regions.

use core::ptr::{self, NonNull};

use const_default::ConstDefault;

/// Writes a recognizable fill over a region when it is handed out and when
/// it is returned.
pub trait MemoryTagger {
    /// Tags a freshly allocated user region.
    ///
    /// # Safety
    /// `ptr` must reference `size` writable bytes not yet exposed to the
    /// caller of the allocation.
    unsafe fn tag_allocation(&mut self, ptr: NonNull<u8>, size: usize) {
        let _ = (ptr, size);
    }

    /// Tags a region being returned to the allocator.
    ///
    /// # Safety
    /// `ptr` must reference `size` writable bytes no longer in use.
    unsafe fn tag_deallocation(&mut self, ptr: NonNull<u8>, size: usize) {
        let _ = (ptr, size);
    }
}

/// Leaves memory untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoTagger;

impl ConstDefault for NoTagger {
    const DEFAULT: Self = NoTagger;
}

impl MemoryTagger for NoTagger {}

/// Byte written over freshly allocated memory by [`PatternTagger`].
pub const ALLOCATED_FILL: u8 = 0xCD;

/// Byte written over deallocated memory by [`PatternTagger`].
pub const DEALLOCATED_FILL: u8 = 0xDD;

/// Fills allocations with [`ALLOCATED_FILL`] and deallocations with
/// [`DEALLOCATED_FILL`], making use of uninitialized or stale memory easy
/// to spot in a debugger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatternTagger;

impl ConstDefault for PatternTagger {
    const DEFAULT: Self = PatternTagger;
}

impl MemoryTagger for PatternTagger {
    unsafe fn tag_allocation(&mut self, ptr: NonNull<u8>, size: usize) {
        ptr::write_bytes(ptr.as_ptr(), ALLOCATED_FILL, size);
    }

    unsafe fn tag_deallocation(&mut self, ptr: NonNull<u8>, size: usize) {
        ptr::write_bytes(ptr.as_ptr(), DEALLOCATED_FILL, size);
    }
}

/// Zeroes regions on both allocation and deallocation.
///
/// Deallocation goes through [`zeroize`] so the wipe is not optimized away,
/// which makes this tagger suitable for buffers holding secrets.
#[cfg(feature = "zeroize")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZeroTagger;

#[cfg(feature = "zeroize")]
impl ConstDefault for ZeroTagger {
    const DEFAULT: Self = ZeroTagger;
}

#[cfg(feature = "zeroize")]
impl MemoryTagger for ZeroTagger {
    unsafe fn tag_allocation(&mut self, ptr: NonNull<u8>, size: usize) {
        ptr::write_bytes(ptr.as_ptr(), 0, size);
    }

    unsafe fn tag_deallocation(&mut self, ptr: NonNull<u8>, size: usize) {
        use zeroize::Zeroize;
        core::slice::from_raw_parts_mut(ptr.as_ptr(), size).zeroize();
    }
}
