//! Block allocation out of a fixed storage buffer.

use core::cell::RefCell;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop, MaybeUninit};

use const_default::ConstDefault;

use crate::alloc::BlockAllocator;
use crate::block::MemoryBlock;
use crate::cache::MemoryBlockCache;
use crate::info::AllocatorInfo;
use crate::pointer::align_forward_offset;

/// A reusable storage buffer of `N` bytes, aligned for any fundamental
/// type.
#[repr(C)]
pub union BlockStorage<const N: usize> {
    _align: [ManuallyDrop<u128>; 0],
    data: [MaybeUninit<u8>; N],
}

impl<const N: usize> BlockStorage<N> {
    /// Access the buffer contents as a mutable slice.
    pub fn as_uninit_slice(&mut self) -> &mut [MaybeUninit<u8>] {
        unsafe { &mut self.data }
    }
}

impl<const N: usize> ConstDefault for BlockStorage<N> {
    const DEFAULT: Self = Self {
        data: unsafe { MaybeUninit::uninit().assume_init() },
    };
}

impl<const N: usize> Default for BlockStorage<N> {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl<const N: usize> fmt::Debug for BlockStorage<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockStorage").finish_non_exhaustive()
    }
}

#[cfg(feature = "zeroize")]
impl<const N: usize> zeroize::Zeroize for BlockStorage<N> {
    #[inline]
    fn zeroize(&mut self) {
        self.as_uninit_slice().zeroize()
    }
}

/// Create a new storage buffer for `N` bytes of block allocation.
pub const fn block_storage<const N: usize>() -> BlockStorage<N> {
    BlockStorage::DEFAULT
}

/// Carves a borrowed storage buffer into equal blocks threaded through a
/// [`MemoryBlockCache`].
///
/// `allocate_block` pops from the cache and `deallocate_block` pushes back;
/// once every block is handed out, allocation yields `None` until one is
/// returned. The storage outlives the allocator by construction; with a
/// `'static` borrow this is a [`StaticBlockAllocator`], whose backing
/// buffer stays pinned for the life of the process.
pub struct StackBlockAllocator<'a> {
    block_size: usize,
    capacity: usize,
    cache: RefCell<MemoryBlockCache>,
    _storage: PhantomData<&'a mut [MaybeUninit<u8>]>,
}

impl<'a> StackBlockAllocator<'a> {
    /// Slices `storage` into blocks of `block_size` bytes.
    ///
    /// `block_size` must be a pointer-aligned multiple of at least
    /// `size_of::<MemoryBlock>()` bytes, since free blocks hold the cache
    /// link in their first bytes. Storage that does not divide evenly is
    /// left unused at the tail.
    pub fn new(storage: &'a mut [MaybeUninit<u8>], block_size: usize) -> Self {
        assert!(block_size >= mem::size_of::<MemoryBlock>());
        assert_eq!(block_size % mem::align_of::<MemoryBlock>(), 0);

        let skip = align_forward_offset(
            storage.as_ptr().cast(),
            mem::align_of::<MemoryBlock>(),
            0,
        );
        let usable = storage.len().saturating_sub(skip);
        let capacity = usable / block_size;

        let mut cache = MemoryBlockCache::new();
        let base = storage.as_mut_ptr().cast::<u8>().wrapping_add(skip);
        for index in (0..capacity).rev() {
            let block =
                MemoryBlock::from_raw_parts(base.wrapping_add(index * block_size), block_size);
            // SAFETY: the block lies inside the exclusively borrowed
            // storage, is pointer-aligned and at least link-sized.
            unsafe { cache.store_block(block) };
        }

        Self {
            block_size,
            capacity,
            cache: RefCell::new(cache),
            _storage: PhantomData,
        }
    }

    /// The configured block size.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Total number of blocks carved from the storage.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl BlockAllocator for StackBlockAllocator<'_> {
    fn allocate_block(&self) -> Option<MemoryBlock> {
        self.cache.borrow_mut().request_block()
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        debug_assert_eq!(block.size(), self.block_size);
        self.cache.borrow_mut().store_block(block);
    }

    fn next_block_size(&self) -> usize {
        if self.cache.borrow().is_empty() {
            0
        } else {
            self.block_size
        }
    }

    fn next_block_alignment(&self) -> usize {
        mem::align_of::<MemoryBlock>()
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new("stack-block", self as *const Self as *const ())
    }
}

impl fmt::Debug for StackBlockAllocator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackBlockAllocator")
            .field("block_size", &self.block_size)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// A block allocator over process-lifetime storage.
pub type StaticBlockAllocator = StackBlockAllocator<'static>;
