//! Cross-cutting policies composed into the arena and the policy block
//! allocator: memory tagging, usage tracking, bounds checking, locking and
//! naming.

mod bounds;
mod lock;
mod named;
mod tagging;
mod tracking;

pub use self::{
    bounds::{BoundsChecker, GuardBoundsChecker, NoBoundsChecker, FENCE_FILL},
    lock::NullLock,
    named::{NamedAllocator, NamedBlockAllocator},
    tagging::{MemoryTagger, NoTagger, PatternTagger, ALLOCATED_FILL, DEALLOCATED_FILL},
    tracking::{CountingTracker, MemoryTracker, NoTracker},
};

#[cfg(feature = "zeroize")]
pub use self::tagging::ZeroTagger;

#[cfg(feature = "alloc")]
pub use self::tracking::AuditTracker;

pub use lock_api::RawMutex;
