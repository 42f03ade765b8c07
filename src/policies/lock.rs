//! The no-op lock policy.

use core::cell::Cell;
use core::marker::PhantomData;

use lock_api::{GuardNoSend, RawMutex};

/// A lock that compiles away.
///
/// `NullLock` is deliberately `!Sync` (and its guards `!Send`): a wrapper
/// locked by it can never be shared across threads, which is exactly what
/// makes doing nothing sound. Plug in a real [`RawMutex`] implementation
/// (e.g. `parking_lot::RawMutex`) when the wrapper is shared.
pub struct NullLock {
    _not_sync: PhantomData<Cell<()>>,
}

unsafe impl RawMutex for NullLock {
    const INIT: NullLock = NullLock {
        _not_sync: PhantomData,
    };

    type GuardMarker = GuardNoSend;

    #[inline]
    fn lock(&self) {}

    #[inline]
    fn try_lock(&self) -> bool {
        true
    }

    #[inline]
    unsafe fn unlock(&self) {}
}
