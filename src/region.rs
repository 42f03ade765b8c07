//! Virtual-memory reservations over the OS paging primitives.

use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicUsize, Ordering};

use std::io;

/// Size of one virtual-memory page. Constant per process; queried once.
pub fn page_size() -> usize {
    static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);
    match PAGE_SIZE.load(Ordering::Relaxed) {
        0 => {
            // SAFETY: sysconf with a valid name has no preconditions.
            let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
            PAGE_SIZE.store(size, Ordering::Relaxed);
            size
        }
        size => size,
    }
}

/// A contiguous reservation of virtual address space, released on drop.
///
/// Pages start uncommitted (inaccessible); [`commit`](Self::commit) makes a
/// span readable and writable, [`decommit`](Self::decommit) returns it to
/// the uncommitted state and lets the OS reclaim the backing frames.
#[derive(Debug)]
pub struct VirtualMemory {
    base: NonNull<u8>,
    pages: usize,
}

impl VirtualMemory {
    /// Reserves `pages` pages of address space without committing them.
    pub fn reserve(pages: usize) -> io::Result<Self> {
        if pages == 0 {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }
        let len = pages
            .checked_mul(page_size())
            .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
        // SAFETY: a fresh anonymous mapping with no fixed address.
        let raw = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANON | libc::MAP_NORESERVE,
                -1,
                0,
            )
        };
        if raw == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        let base = NonNull::new(raw.cast::<u8>())
            .ok_or_else(|| io::Error::from(io::ErrorKind::OutOfMemory))?;
        Ok(Self { base, pages })
    }

    /// Number of reserved pages.
    #[inline]
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Total reserved bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.pages * page_size()
    }

    /// Whether the reservation is empty. Never true; reservations hold at
    /// least one page.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The address of page `page`.
    #[inline]
    pub fn at(&self, page: usize) -> *mut u8 {
        debug_assert!(page <= self.pages);
        self.base.as_ptr().wrapping_add(page * page_size())
    }

    /// Commits `count` pages starting at `page`, returning the span's base
    /// address.
    pub fn commit(&self, page: usize, count: usize) -> io::Result<NonNull<u8>> {
        self.check_span(page, count)?;
        let addr = self.at(page);
        // SAFETY: the span lies inside this mapping.
        let rc = unsafe {
            libc::mprotect(
                addr.cast(),
                count * page_size(),
                libc::PROT_READ | libc::PROT_WRITE,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: addr is inside a non-null mapping.
        Ok(unsafe { NonNull::new_unchecked(addr) })
    }

    /// Decommits `count` pages starting at `page`.
    pub fn decommit(&self, page: usize, count: usize) -> io::Result<()> {
        self.check_span(page, count)?;
        let addr = self.at(page).cast();
        let len = count * page_size();
        // SAFETY: the span lies inside this mapping.
        let rc = unsafe { libc::madvise(addr, len, libc::MADV_DONTNEED) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: as above.
        let rc = unsafe { libc::mprotect(addr, len, libc::PROT_NONE) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn check_span(&self, page: usize, count: usize) -> io::Result<()> {
        if count == 0 || page.checked_add(count).map_or(true, |end| end > self.pages) {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }
        Ok(())
    }
}

impl Drop for VirtualMemory {
    fn drop(&mut self) {
        // SAFETY: the mapping was created by reserve() and is unmapped
        // exactly once.
        unsafe {
            libc::munmap(self.base.as_ptr().cast(), self.len());
        }
    }
}

// SAFETY: the reservation is exclusively owned; the base pointer is not
// aliased elsewhere.
unsafe impl Send for VirtualMemory {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_a_power_of_two() {
        assert!(page_size().is_power_of_two());
    }

    #[test]
    fn commit_write_decommit() {
        let memory = VirtualMemory::reserve(4).unwrap();
        assert_eq!(memory.pages(), 4);

        let span = memory.commit(1, 2).unwrap();
        assert_eq!(span.as_ptr(), memory.at(1));
        unsafe {
            span.as_ptr().write(0xA5);
            span.as_ptr().add(2 * page_size() - 1).write(0x5A);
            assert_eq!(span.as_ptr().read(), 0xA5);
        }
        memory.decommit(1, 2).unwrap();
    }

    #[test]
    fn out_of_range_span_is_rejected() {
        let memory = VirtualMemory::reserve(2).unwrap();
        assert!(memory.commit(1, 2).is_err());
        assert!(memory.commit(0, 0).is_err());
        assert!(memory.decommit(2, 1).is_err());
    }
}
