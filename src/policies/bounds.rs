//! Bounds checkers: guard patterns placed around user regions to detect
//! overruns at deallocation time.

use const_default::ConstDefault;

use crate::handlers;
use crate::info::AllocatorInfo;

/// Places and verifies guard fences adjacent to each allocation.
///
/// The wrapper reserves [`FRONT_SIZE`](Self::FRONT_SIZE) bytes before and
/// [`BACK_SIZE`](Self::BACK_SIZE) bytes after the user region and hands the
/// fence locations to these hooks.
pub trait BoundsChecker {
    /// Guard bytes before the user region.
    const FRONT_SIZE: usize;

    /// Guard bytes after the user region.
    const BACK_SIZE: usize;

    /// Writes the front guard pattern.
    ///
    /// # Safety
    /// `fence` must reference `FRONT_SIZE` writable bytes.
    unsafe fn prepare_front_fence(&mut self, fence: *mut u8) {
        let _ = fence;
    }

    /// Writes the back guard pattern.
    ///
    /// # Safety
    /// `fence` must reference `BACK_SIZE` writable bytes.
    unsafe fn prepare_back_fence(&mut self, fence: *mut u8) {
        let _ = fence;
    }

    /// Verifies the front guard, reporting through the buffer-overflow
    /// handler on mismatch.
    ///
    /// # Safety
    /// `fence` must reference the `FRONT_SIZE` bytes prepared for this
    /// allocation; `user_ptr`/`size` describe the user region.
    unsafe fn check_front_fence(
        &self,
        info: &AllocatorInfo,
        user_ptr: *const u8,
        size: usize,
        fence: *const u8,
    ) {
        let _ = (info, user_ptr, size, fence);
    }

    /// Verifies the back guard, reporting through the buffer-overflow
    /// handler on mismatch.
    ///
    /// # Safety
    /// As for [`check_front_fence`](Self::check_front_fence).
    unsafe fn check_back_fence(
        &self,
        info: &AllocatorInfo,
        user_ptr: *const u8,
        size: usize,
        fence: *const u8,
    ) {
        let _ = (info, user_ptr, size, fence);
    }
}

/// No guards; allocation overhead stays zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoBoundsChecker;

impl ConstDefault for NoBoundsChecker {
    const DEFAULT: Self = NoBoundsChecker;
}

impl BoundsChecker for NoBoundsChecker {
    const FRONT_SIZE: usize = 0;
    const BACK_SIZE: usize = 0;
}

/// Byte written into guard fences by [`GuardBoundsChecker`].
pub const FENCE_FILL: u8 = 0xFD;

/// `N`-byte [`FENCE_FILL`] fences on both sides of every allocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuardBoundsChecker<const N: usize>;

impl<const N: usize> ConstDefault for GuardBoundsChecker<N> {
    const DEFAULT: Self = GuardBoundsChecker;
}

impl<const N: usize> GuardBoundsChecker<N> {
    unsafe fn check(
        info: &AllocatorInfo,
        user_ptr: *const u8,
        size: usize,
        fence: *const u8,
    ) {
        for i in 0..N {
            if fence.add(i).read() != FENCE_FILL {
                handlers::BUFFER_OVERFLOW_HANDLER.get()(info, user_ptr, size);
                return;
            }
        }
    }
}

impl<const N: usize> BoundsChecker for GuardBoundsChecker<N> {
    const FRONT_SIZE: usize = N;
    const BACK_SIZE: usize = N;

    unsafe fn prepare_front_fence(&mut self, fence: *mut u8) {
        core::ptr::write_bytes(fence, FENCE_FILL, N);
    }

    unsafe fn prepare_back_fence(&mut self, fence: *mut u8) {
        core::ptr::write_bytes(fence, FENCE_FILL, N);
    }

    unsafe fn check_front_fence(
        &self,
        info: &AllocatorInfo,
        user_ptr: *const u8,
        size: usize,
        fence: *const u8,
    ) {
        Self::check(info, user_ptr, size, fence);
    }

    unsafe fn check_back_fence(
        &self,
        info: &AllocatorInfo,
        user_ptr: *const u8,
        size: usize,
        fence: *const u8,
    ) {
        Self::check(info, user_ptr, size, fence);
    }
}
