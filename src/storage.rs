//! Ownership adapters for allocator instances.
//!
//! Higher-level glue (deleters, the standard adapter) is generic over a
//! *storage*: a cheap, cloneable handle that resolves to an allocator.
//! Three flavors cover the useful ownership shapes: borrowed, shared and
//! inline-stateless.

use core::fmt;
use core::ptr;

use crate::alloc::{BlockAllocator, RawAllocator, Stateless};

#[cfg(feature = "alloc")]
use alloc_crate::rc::Rc;

/// A cloneable handle resolving to a byte allocator.
pub trait AllocatorStorage: Clone {
    /// The allocator type this storage resolves to.
    type Alloc: RawAllocator + ?Sized;

    /// The stored allocator.
    fn allocator(&self) -> &Self::Alloc;
}

/// A cloneable handle resolving to a block allocator.
pub trait BlockAllocatorStorage: Clone {
    /// The block allocator type this storage resolves to.
    type Alloc: BlockAllocator + ?Sized;

    /// The stored block allocator.
    fn block_allocator(&self) -> &Self::Alloc;
}

/// Borrows an externally owned allocator, which must outlive every user of
/// the storage.
pub struct ReferencedAllocatorStorage<'a, A: RawAllocator> {
    inner: &'a A,
}

impl<'a, A: RawAllocator> ReferencedAllocatorStorage<'a, A> {
    /// Borrows `alloc`.
    #[inline]
    pub const fn new(alloc: &'a A) -> Self {
        Self { inner: alloc }
    }
}

impl<A: RawAllocator> AllocatorStorage for ReferencedAllocatorStorage<'_, A> {
    type Alloc = A;

    #[inline]
    fn allocator(&self) -> &A {
        self.inner
    }
}

impl<A: RawAllocator> Clone for ReferencedAllocatorStorage<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: RawAllocator> Copy for ReferencedAllocatorStorage<'_, A> {}

impl<A: RawAllocator> PartialEq for ReferencedAllocatorStorage<'_, A> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.inner, other.inner)
    }
}

impl<A: RawAllocator> Eq for ReferencedAllocatorStorage<'_, A> {}

impl<A: RawAllocator> fmt::Debug for ReferencedAllocatorStorage<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferencedAllocatorStorage").finish_non_exhaustive()
    }
}

/// Borrows an externally owned block allocator.
pub struct ReferencedBlockAllocatorStorage<'a, B: BlockAllocator> {
    inner: &'a B,
}

impl<'a, B: BlockAllocator> ReferencedBlockAllocatorStorage<'a, B> {
    /// Borrows `alloc`.
    #[inline]
    pub const fn new(alloc: &'a B) -> Self {
        Self { inner: alloc }
    }
}

impl<B: BlockAllocator> BlockAllocatorStorage for ReferencedBlockAllocatorStorage<'_, B> {
    type Alloc = B;

    #[inline]
    fn block_allocator(&self) -> &B {
        self.inner
    }
}

impl<B: BlockAllocator> Clone for ReferencedBlockAllocatorStorage<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: BlockAllocator> Copy for ReferencedBlockAllocatorStorage<'_, B> {}

impl<B: BlockAllocator> PartialEq for ReferencedBlockAllocatorStorage<'_, B> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.inner, other.inner)
    }
}

impl<B: BlockAllocator> Eq for ReferencedBlockAllocatorStorage<'_, B> {}

impl<B: BlockAllocator> fmt::Debug for ReferencedBlockAllocatorStorage<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferencedBlockAllocatorStorage").finish_non_exhaustive()
    }
}

/// Shares ownership of an allocator through a reference count.
#[cfg(feature = "alloc")]
#[derive(Debug)]
pub struct SharedAllocatorStorage<A: RawAllocator> {
    inner: Rc<A>,
}

#[cfg(feature = "alloc")]
impl<A: RawAllocator> SharedAllocatorStorage<A> {
    /// Moves `alloc` into shared ownership.
    pub fn new(alloc: A) -> Self {
        Self {
            inner: Rc::new(alloc),
        }
    }

    /// Adopts an existing shared handle.
    pub fn from_rc(alloc: Rc<A>) -> Self {
        Self { inner: alloc }
    }
}

#[cfg(feature = "alloc")]
impl<A: RawAllocator> AllocatorStorage for SharedAllocatorStorage<A> {
    type Alloc = A;

    #[inline]
    fn allocator(&self) -> &A {
        &self.inner
    }
}

#[cfg(feature = "alloc")]
impl<A: RawAllocator> Clone for SharedAllocatorStorage<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "alloc")]
impl<A: RawAllocator> PartialEq for SharedAllocatorStorage<A> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(feature = "alloc")]
impl<A: RawAllocator> Eq for SharedAllocatorStorage<A> {}

/// Shares ownership of a block allocator through a reference count.
#[cfg(feature = "alloc")]
#[derive(Debug)]
pub struct SharedBlockAllocatorStorage<B: BlockAllocator> {
    inner: Rc<B>,
}

#[cfg(feature = "alloc")]
impl<B: BlockAllocator> SharedBlockAllocatorStorage<B> {
    /// Moves `alloc` into shared ownership.
    pub fn new(alloc: B) -> Self {
        Self {
            inner: Rc::new(alloc),
        }
    }

    /// Adopts an existing shared handle.
    pub fn from_rc(alloc: Rc<B>) -> Self {
        Self { inner: alloc }
    }
}

#[cfg(feature = "alloc")]
impl<B: BlockAllocator> BlockAllocatorStorage for SharedBlockAllocatorStorage<B> {
    type Alloc = B;

    #[inline]
    fn block_allocator(&self) -> &B {
        &self.inner
    }
}

#[cfg(feature = "alloc")]
impl<B: BlockAllocator> Clone for SharedBlockAllocatorStorage<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "alloc")]
impl<B: BlockAllocator> PartialEq for SharedBlockAllocatorStorage<B> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(feature = "alloc")]
impl<B: BlockAllocator> Eq for SharedBlockAllocatorStorage<B> {}

/// Holds a stateless allocator inline; all instances are interchangeable.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatelessAllocatorStorage<A: Stateless> {
    inner: A,
}

impl<A: Stateless> StatelessAllocatorStorage<A> {
    /// Materializes the storage.
    pub fn new() -> Self {
        Self {
            inner: A::default(),
        }
    }
}

impl<A: Stateless + RawAllocator> AllocatorStorage for StatelessAllocatorStorage<A> {
    type Alloc = A;

    #[inline]
    fn allocator(&self) -> &A {
        &self.inner
    }
}

impl<A: Stateless> PartialEq for StatelessAllocatorStorage<A> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<A: Stateless> Eq for StatelessAllocatorStorage<A> {}

/// Holds a stateless block allocator inline; all instances are
/// interchangeable.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatelessBlockAllocatorStorage<B: Stateless> {
    inner: B,
}

impl<B: Stateless> StatelessBlockAllocatorStorage<B> {
    /// Materializes the storage.
    pub fn new() -> Self {
        Self {
            inner: B::default(),
        }
    }
}

impl<B: Stateless + BlockAllocator> BlockAllocatorStorage for StatelessBlockAllocatorStorage<B> {
    type Alloc = B;

    #[inline]
    fn block_allocator(&self) -> &B {
        &self.inner
    }
}

impl<B: Stateless> PartialEq for StatelessBlockAllocatorStorage<B> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<B: Stateless> Eq for StatelessBlockAllocatorStorage<B> {}
