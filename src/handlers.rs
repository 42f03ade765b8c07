//! Process-wide failure handlers.
//!
//! Each handler lives in an atomic slot with swap semantics: installing a
//! new handler returns the previous one so it can be chained or restored.
//! The defaults write a diagnostic and abort the process.

use core::mem;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::info::AllocatorInfo;

/// Invoked when a non-`try` allocation cannot be satisfied.
pub type OutOfMemoryHandler = fn(info: &AllocatorInfo, requested: usize);

/// Invoked at allocator teardown when outstanding allocations remain.
pub type LeakHandler = fn(info: &AllocatorInfo, ptr: *const u8, bytes: usize);

/// Invoked when a guard pattern around an allocation was overwritten.
pub type BufferOverflowHandler = fn(info: &AllocatorInfo, ptr: *const u8, size: usize);

/// Invoked when a pointer is deallocated twice.
pub type DoubleDeleteHandler = fn(info: &AllocatorInfo, ptr: *const u8, size: usize);

/// Invoked when a deallocated pointer was never produced by the allocator.
pub type StompHandler = fn(info: &AllocatorInfo, ptr: *const u8, size: usize);

/// An atomic cell holding one process-wide handler.
///
/// `F` is always a `fn` pointer type; the slot stores it type-erased so the
/// cell itself can be a `static`.
pub struct HandlerSlot<F> {
    slot: AtomicPtr<()>,
    default: F,
}

impl<F: Copy> HandlerSlot<F> {
    /// Creates a slot whose initial handler is `default`.
    pub const fn new(default: F) -> Self {
        Self {
            slot: AtomicPtr::new(ptr::null_mut()),
            default,
        }
    }

    /// Installs `handler`, returning the handler it replaces.
    pub fn set(&self, handler: F) -> F {
        let prev = self.slot.swap(to_raw(handler), Ordering::AcqRel);
        if prev.is_null() {
            self.default
        } else {
            from_raw(prev)
        }
    }

    /// The currently installed handler.
    pub fn get(&self) -> F {
        let current = self.slot.load(Ordering::Acquire);
        if current.is_null() {
            self.default
        } else {
            from_raw(current)
        }
    }
}

#[inline]
fn to_raw<F: Copy>(f: F) -> *mut () {
    assert_eq!(mem::size_of::<F>(), mem::size_of::<*mut ()>());
    // SAFETY: F is a fn pointer, which is the same size and validity as a
    // raw pointer on all supported targets.
    unsafe { mem::transmute_copy(&f) }
}

#[inline]
fn from_raw<F: Copy>(raw: *mut ()) -> F {
    assert_eq!(mem::size_of::<F>(), mem::size_of::<*mut ()>());
    // SAFETY: `raw` was produced by `to_raw` from a value of type F.
    unsafe { mem::transmute_copy(&raw) }
}

/// The out-of-memory handler slot.
pub static OUT_OF_MEMORY_HANDLER: HandlerSlot<OutOfMemoryHandler> =
    HandlerSlot::new(default_out_of_memory);

/// The leak handler slot.
pub static LEAK_HANDLER: HandlerSlot<LeakHandler> = HandlerSlot::new(default_leak);

/// The buffer-overflow handler slot.
pub static BUFFER_OVERFLOW_HANDLER: HandlerSlot<BufferOverflowHandler> =
    HandlerSlot::new(default_buffer_overflow);

/// The double-delete handler slot.
pub static DOUBLE_DELETE_HANDLER: HandlerSlot<DoubleDeleteHandler> =
    HandlerSlot::new(default_double_delete);

/// The stomp handler slot.
pub static STOMP_HANDLER: HandlerSlot<StompHandler> = HandlerSlot::new(default_stomp);

#[cold]
fn die(msg: core::fmt::Arguments<'_>) -> ! {
    // Handlers run on allocation failure paths, so the diagnostic itself
    // must not allocate.
    #[cfg(feature = "std")]
    {
        use std::io::Write;
        let _ = writeln!(std::io::stderr(), "{msg}");
        std::process::abort();
    }
    #[cfg(not(feature = "std"))]
    panic!("{}", msg);
}

fn default_out_of_memory(info: &AllocatorInfo, requested: usize) {
    die(format_args!(
        "allocator `{}` ({:p}): out of memory allocating {requested} bytes",
        info.name(),
        info.address()
    ));
}

fn default_leak(info: &AllocatorInfo, ptr: *const u8, bytes: usize) {
    die(format_args!(
        "allocator `{}` ({:p}): leaked {bytes} bytes (first at {ptr:p})",
        info.name(),
        info.address()
    ));
}

fn default_buffer_overflow(info: &AllocatorInfo, ptr: *const u8, size: usize) {
    die(format_args!(
        "allocator `{}` ({:p}): guard bytes overwritten around {ptr:p} ({size} bytes)",
        info.name(),
        info.address()
    ));
}

fn default_double_delete(info: &AllocatorInfo, ptr: *const u8, size: usize) {
    die(format_args!(
        "allocator `{}` ({:p}): double deallocation of {ptr:p} ({size} bytes)",
        info.name(),
        info.address()
    ));
}

fn default_stomp(info: &AllocatorInfo, ptr: *const u8, size: usize) {
    die(format_args!(
        "allocator `{}` ({:p}): deallocated pointer {ptr:p} ({size} bytes) was never allocated",
        info.name(),
        info.address()
    ));
}
