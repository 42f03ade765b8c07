//! The arena allocator: a byte allocator composed with tagging, tracking,
//! bounds-checking and locking policies.

use core::ptr::NonNull;

use lock_api::{Mutex, RawMutex};

use crate::alloc::{DeallocateAll, OffsetAllocator, Owns, RawAllocator};
use crate::info::AllocatorInfo;
use crate::policies::{
    BoundsChecker, MemoryTagger, MemoryTracker, NoBoundsChecker, NoTagger, NoTracker, NullLock,
};

struct ArenaState<A, Tag, Track, Bounds> {
    alloc: A,
    tagger: Tag,
    tracker: Track,
    bounds: Bounds,
}

/// Wraps an [`OffsetAllocator`] with cross-cutting policies.
///
/// Every public operation runs under `Lock`; the guard is released on all
/// exit paths. On allocation the bounds checker places its fences around
/// the user region (the offset form of the underlying allocator keeps the
/// user pointer aligned past the front fence), the tagger fills the region,
/// and the tracker records the event. Deallocation verifies the fences,
/// tags, records, and forwards to the underlying allocator. Dropping the
/// arena finalizes the tracker, which reports leaks through the
/// process-wide leak handler.
///
/// With the default policies this is a transparent, single-threaded wrapper
/// that compiles down to the underlying allocator.
pub struct ArenaAllocator<
    A: RawAllocator,
    Tag: MemoryTagger = NoTagger,
    Track: MemoryTracker = NoTracker,
    Bounds: BoundsChecker = NoBoundsChecker,
    Lock: RawMutex = NullLock,
> {
    state: Mutex<Lock, ArenaState<A, Tag, Track, Bounds>>,
}

impl<A, Tag, Track, Bounds, Lock> ArenaAllocator<A, Tag, Track, Bounds, Lock>
where
    A: RawAllocator,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Bounds: BoundsChecker,
    Lock: RawMutex,
{
    /// Combined fence overhead added to every allocation.
    const OVERHEAD: usize = Bounds::FRONT_SIZE + Bounds::BACK_SIZE;

    /// Creates an arena over `alloc` with default-constructed policies.
    pub fn new(alloc: A) -> Self
    where
        Tag: Default,
        Track: Default,
        Bounds: Default,
    {
        Self::with_policies(alloc, Tag::default(), Track::default(), Bounds::default())
    }

    /// Creates an arena from explicit policy instances.
    pub fn with_policies(alloc: A, tagger: Tag, tracker: Track, bounds: Bounds) -> Self {
        Self {
            state: Mutex::new(ArenaState {
                alloc,
                tagger,
                tracker,
                bounds,
            }),
        }
    }

    /// Runs `f` against the tracker under the lock.
    pub fn with_tracker<R>(&self, f: impl FnOnce(&Track) -> R) -> R {
        f(&self.state.lock().tracker)
    }

    /// Consumes the arena without finalizing the tracker, returning the
    /// underlying allocator.
    pub fn into_inner(self) -> A {
        let mut this = core::mem::ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the state is moved out
        // exactly once.
        let state = unsafe { core::ptr::read(this.state.get_mut()) };
        state.alloc
    }
}

impl<A, Tag, Track, Bounds, Lock> ArenaAllocator<A, Tag, Track, Bounds, Lock>
where
    A: OffsetAllocator,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Bounds: BoundsChecker,
    Lock: RawMutex,
{
    /// Tries to allocate `size` bytes aligned to `align`.
    pub fn try_allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        self.try_allocate_offset(size, align, 0)
    }

    /// Tries to allocate `size` bytes with the alignment applying at
    /// `ptr + offset`.
    pub fn try_allocate_offset(
        &self,
        size: usize,
        align: usize,
        offset: usize,
    ) -> Option<NonNull<u8>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let total = size.checked_add(Self::OVERHEAD)?;
        let raw = state
            .alloc
            .try_allocate_offset(total, align, Bounds::FRONT_SIZE + offset)?;
        // SAFETY: the allocation spans `total` bytes, so the fence and user
        // regions derived below are all in bounds.
        unsafe {
            let user = raw.as_ptr().add(Bounds::FRONT_SIZE);
            state.bounds.prepare_front_fence(raw.as_ptr());
            state.bounds.prepare_back_fence(user.add(size));
            let user = NonNull::new_unchecked(user);
            state.tagger.tag_allocation(user, size);
            state.tracker.on_allocate(user, size, align);
            Some(user)
        }
    }

    /// Verifies the fences and returns the allocation at `ptr`.
    ///
    /// # Safety
    /// `ptr` must come from a previous successful `try_allocate` /
    /// `try_allocate_offset` on this arena with the same `size`, not yet
    /// deallocated.
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let info = state.alloc.info();
        state.bounds.check_front_fence(
            &info,
            ptr.as_ptr(),
            size,
            ptr.as_ptr().sub(Bounds::FRONT_SIZE),
        );
        state
            .bounds
            .check_back_fence(&info, ptr.as_ptr(), size, ptr.as_ptr().add(size));
        state.tagger.tag_deallocation(ptr, size);
        state.tracker.on_deallocate(&info, ptr, size);
        let raw = NonNull::new_unchecked(ptr.as_ptr().sub(Bounds::FRONT_SIZE));
        state.alloc.deallocate(raw, size + Self::OVERHEAD);
    }

    /// Diagnostic identity of the underlying allocator.
    pub fn info(&self) -> AllocatorInfo {
        self.state.lock().alloc.info()
    }

    /// Largest user-visible request the underlying allocator could
    /// satisfy, net of fence overhead.
    pub fn max_size(&self) -> usize {
        self.state.lock().alloc.max_size().saturating_sub(Self::OVERHEAD)
    }
}

impl<A, Tag, Track, Bounds, Lock> ArenaAllocator<A, Tag, Track, Bounds, Lock>
where
    A: OffsetAllocator + DeallocateAll,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Bounds: BoundsChecker,
    Lock: RawMutex,
{
    /// Truncates every outstanding allocation at once.
    pub fn deallocate_all(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.tracker.on_deallocate_all();
        state.alloc.deallocate_all();
    }
}

impl<A, Tag, Track, Bounds, Lock> ArenaAllocator<A, Tag, Track, Bounds, Lock>
where
    A: OffsetAllocator + Owns,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Bounds: BoundsChecker,
    Lock: RawMutex,
{
    /// Whether `ptr` points into memory owned by the underlying allocator.
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.state.lock().alloc.owns(ptr)
    }
}

impl<A, Tag, Track, Bounds, Lock> Drop for ArenaAllocator<A, Tag, Track, Bounds, Lock>
where
    A: RawAllocator,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Bounds: BoundsChecker,
    Lock: RawMutex,
{
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let info = state.alloc.info();
        state.tracker.finalize(&info);
    }
}

unsafe impl<A, Tag, Track, Bounds, Lock> RawAllocator
    for ArenaAllocator<A, Tag, Track, Bounds, Lock>
where
    A: OffsetAllocator,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Bounds: BoundsChecker,
    Lock: RawMutex,
{
    const DEFAULT_ALIGNMENT: usize = A::DEFAULT_ALIGNMENT;
    const MAX_ALIGNMENT: usize = A::MAX_ALIGNMENT;

    #[inline]
    fn try_allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        ArenaAllocator::try_allocate(self, size, align)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        ArenaAllocator::deallocate(self, ptr, size)
    }

    #[inline]
    fn info(&self) -> AllocatorInfo {
        ArenaAllocator::info(self)
    }

    #[inline]
    fn max_size(&self) -> usize {
        ArenaAllocator::max_size(self)
    }
}

unsafe impl<A, Tag, Track, Bounds, Lock> OffsetAllocator
    for ArenaAllocator<A, Tag, Track, Bounds, Lock>
where
    A: OffsetAllocator,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Bounds: BoundsChecker,
    Lock: RawMutex,
{
    #[inline]
    fn try_allocate_offset(
        &self,
        size: usize,
        align: usize,
        offset: usize,
    ) -> Option<NonNull<u8>> {
        ArenaAllocator::try_allocate_offset(self, size, align, offset)
    }
}

impl<A, Tag, Track, Bounds, Lock> DeallocateAll for ArenaAllocator<A, Tag, Track, Bounds, Lock>
where
    A: OffsetAllocator + DeallocateAll,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Bounds: BoundsChecker,
    Lock: RawMutex,
{
    #[inline]
    fn deallocate_all(&self) {
        ArenaAllocator::deallocate_all(self)
    }
}

impl<A, Tag, Track, Bounds, Lock> Owns for ArenaAllocator<A, Tag, Track, Bounds, Lock>
where
    A: OffsetAllocator + Owns,
    Tag: MemoryTagger,
    Track: MemoryTracker,
    Bounds: BoundsChecker,
    Lock: RawMutex,
{
    #[inline]
    fn owns(&self, ptr: *const u8) -> bool {
        ArenaAllocator::owns(self, ptr)
    }
}
