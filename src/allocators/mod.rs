//! Byte-granular allocation strategies.

mod any;
mod arena;
mod bump;
mod bump_lifo;
mod min_aligned;
mod pool;

pub use self::{
    any::AnyAllocatorRef,
    arena::ArenaAllocator,
    bump::{BumpDownAllocator, BumpUpAllocator},
    bump_lifo::{BumpDownLifoAllocator, BumpUpLifoAllocator},
    min_aligned::MinAlignedAllocator,
    pool::PoolAllocator,
};
