//! Descriptor-based mapping via `mmap(2)`.

use std::ffi::c_void;
use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::ptr;

/// A live read-only mapping. Unmapped exactly once, when dropped.
///
/// Holds no descriptor: the mapping stays valid after `close(2)`.
pub(crate) struct PlatformResources {
    addr: *mut c_void,
    len: usize,
}

// SAFETY: the region is mapped PROT_READ and only ever read through shared
// references, so it may be moved to and shared with other threads.
unsafe impl Send for PlatformResources {}
// SAFETY: see above.
unsafe impl Sync for PlatformResources {}

impl PlatformResources {
    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.addr.cast::<u8>().cast_const()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl Drop for PlatformResources {
    fn drop(&mut self) {
        // SAFETY: addr/len are exactly what mmap returned, and this is the only
        // place that unmaps them.
        if unsafe { libc::munmap(self.addr, self.len) } != 0 {
            log::warn!("munmap of {} bytes failed: {}", self.len, io::Error::last_os_error());
        } else {
            log::trace!("unmapped {} bytes", self.len);
        }
    }
}

/// Map `len` bytes of `file` read-only and close the descriptor.
///
/// `MAP_SHARED` keeps the view coherent with the page cache, which matches
/// what a read-only view gives on Windows.
pub(crate) fn map_read_only(file: File, len: usize) -> io::Result<PlatformResources> {
    // SAFETY: the descriptor is open for reading for the whole call and len is
    // non-zero. The kernel chooses the address.
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ,
            libc::MAP_SHARED,
            file.as_raw_fd(),
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        // Capture errno before `file` is closed on return.
        return Err(io::Error::last_os_error());
    }
    drop(file);
    Ok(PlatformResources { addr, len })
}
