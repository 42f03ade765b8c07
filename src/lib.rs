//! Composable memory allocators with pluggable policies.
//!
//! This crate is a toolkit for building bespoke allocation strategies out
//! of small, orthogonal parts: block sources produce [`MemoryBlock`]s, byte
//! allocators (bump, pool) distribute them, and policy decorators layer
//! tagging, tracking, bounds checking, locking and naming on top. Storage
//! adapters and deleters tie composed allocators into smart-pointer and
//! generic-container code.
//!
//! ```
//! use core::mem::MaybeUninit;
//!
//! use compose_alloc::alloc::{DeallocateAll, RawAllocator};
//! use compose_alloc::allocators::BumpUpAllocator;
//! use compose_alloc::block::MemoryBlock;
//!
//! let mut buf = [MaybeUninit::<u8>::uninit(); 256];
//! let block = MemoryBlock::from_slice(&mut buf);
//! // SAFETY: `buf` outlives the allocator and is not used directly while
//! // the allocator distributes it.
//! let bump = unsafe { BumpUpAllocator::new(block) };
//!
//! let first = bump.try_allocate(64, 8).unwrap();
//! let second = bump.try_allocate(64, 8).unwrap();
//! assert!(second > first);
//! bump.deallocate_all();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc as alloc_crate;

pub mod alloc;

pub mod allocators;

pub mod block;

pub mod block_allocators;

pub mod cache;

pub mod deleter;

pub mod growth;

pub mod handlers;

pub mod info;

pub mod pointer;

pub mod policies;

#[cfg(all(feature = "std", unix))]
pub mod region;

#[cfg(feature = "allocator-api2")]
pub mod standard;

pub mod storage;

pub use self::block::MemoryBlock;
pub use self::info::AllocatorInfo;
