//! Per-thread block allocation.

use core::cell::RefCell;
use core::mem;

use const_default::ConstDefault;

use crate::alloc::{BlockAllocator, Stateless};
use crate::block::MemoryBlock;
use crate::cache::MemoryBlockCache;
use crate::info::AllocatorInfo;

use std::boxed::Box;
use std::collections::BTreeMap;
use std::vec::Vec;

struct ThreadPool {
    // Keeps the carved storage alive until the thread exits.
    _storage: Box<[mem::MaybeUninit<u128>]>,
    cache: MemoryBlockCache,
}

std::thread_local! {
    static POOLS: RefCell<BTreeMap<(usize, usize), ThreadPool>> =
        RefCell::new(BTreeMap::new());
}

/// A stateless handle to per-thread block storage.
///
/// The first allocation on each thread carves `BLOCKS` blocks of
/// `BLOCK_SIZE` bytes out of a buffer owned by that thread; the buffer
/// stays pinned until the thread exits. All instances with the same
/// parameters share the calling thread's storage, and blocks must be
/// returned on the thread that allocated them.
///
/// `BLOCK_SIZE` must be a pointer-aligned multiple of at least
/// `size_of::<MemoryBlock>()` bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThreadLocalBlockAllocator<const BLOCK_SIZE: usize, const BLOCKS: usize>;

impl<const BLOCK_SIZE: usize, const BLOCKS: usize>
    ThreadLocalBlockAllocator<BLOCK_SIZE, BLOCKS>
{
    fn carve() -> ThreadPool {
        assert!(BLOCK_SIZE >= mem::size_of::<MemoryBlock>());
        assert_eq!(BLOCK_SIZE % mem::align_of::<MemoryBlock>(), 0);

        let words = (BLOCK_SIZE * BLOCKS).div_ceil(mem::size_of::<u128>());
        let mut storage: Box<[mem::MaybeUninit<u128>]> =
            (0..words).map(|_| mem::MaybeUninit::uninit()).collect::<Vec<_>>().into();

        let mut cache = MemoryBlockCache::new();
        let base = storage.as_mut_ptr().cast::<u8>();
        for index in (0..BLOCKS).rev() {
            let block =
                MemoryBlock::from_raw_parts(base.wrapping_add(index * BLOCK_SIZE), BLOCK_SIZE);
            // SAFETY: the block lies inside the boxed storage owned by the
            // pool, is pointer-aligned and at least link-sized.
            unsafe { cache.store_block(block) };
        }

        ThreadPool {
            _storage: storage,
            cache,
        }
    }

    fn with_pool<R>(f: impl FnOnce(&mut ThreadPool) -> R) -> R {
        POOLS.with(|pools| {
            let mut pools = pools.borrow_mut();
            let pool = pools
                .entry((BLOCK_SIZE, BLOCKS))
                .or_insert_with(Self::carve);
            f(pool)
        })
    }
}

impl<const BLOCK_SIZE: usize, const BLOCKS: usize> ConstDefault
    for ThreadLocalBlockAllocator<BLOCK_SIZE, BLOCKS>
{
    const DEFAULT: Self = ThreadLocalBlockAllocator;
}

impl<const BLOCK_SIZE: usize, const BLOCKS: usize> BlockAllocator
    for ThreadLocalBlockAllocator<BLOCK_SIZE, BLOCKS>
{
    fn allocate_block(&self) -> Option<MemoryBlock> {
        Self::with_pool(|pool| pool.cache.request_block())
    }

    unsafe fn deallocate_block(&self, block: MemoryBlock) {
        debug_assert_eq!(block.size(), BLOCK_SIZE);
        // SAFETY: the caller promises the block came from this thread's
        // pool, which satisfies the cache's storage requirements.
        Self::with_pool(|pool| unsafe { pool.cache.store_block(block) });
    }

    fn next_block_size(&self) -> usize {
        Self::with_pool(|pool| {
            if pool.cache.is_empty() {
                0
            } else {
                BLOCK_SIZE
            }
        })
    }

    fn next_block_alignment(&self) -> usize {
        mem::align_of::<MemoryBlock>()
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new("thread-local-block", self as *const Self as *const ())
    }
}

unsafe impl<const BLOCK_SIZE: usize, const BLOCKS: usize> Stateless
    for ThreadLocalBlockAllocator<BLOCK_SIZE, BLOCKS>
{
}
