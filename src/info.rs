//! Diagnostic identity of an allocator instance.

/// A `(name, address)` pair identifying an allocator for diagnostics.
///
/// The address is opaque; it is only compared for equality and printed by
/// handlers. Wrappers such as the named allocators override the name while
/// keeping the address of the underlying instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocatorInfo {
    name: &'static str,
    address: *const (),
}

impl AllocatorInfo {
    /// Creates an info value with an explicit name.
    #[inline]
    pub const fn new(name: &'static str, address: *const ()) -> Self {
        Self { name, address }
    }

    /// Creates the default info for an allocator without a name.
    #[inline]
    pub const fn unnamed(address: *const ()) -> Self {
        Self::new("unnamed", address)
    }

    /// The diagnostic name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The address of the allocator instance this info describes.
    #[inline]
    pub const fn address(&self) -> *const () {
        self.address
    }
}
