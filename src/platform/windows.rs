//! Handle-based mapping via `CreateFileMappingW` / `MapViewOfFile`.

use std::ffi::c_void;
use std::fs::File;
use std::io;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};
use std::ptr;

const PAGE_READONLY: u32 = 0x02;
const FILE_MAP_READ: u32 = 0x0004;

extern "system" {
    fn CreateFileMappingW(
        hFile: *mut c_void,
        lpFileMappingAttributes: *const c_void,
        flProtect: u32,
        dwMaximumSizeHigh: u32,
        dwMaximumSizeLow: u32,
        lpName: *const u16,
    ) -> *mut c_void;

    fn MapViewOfFile(
        hFileMappingObject: *mut c_void,
        dwDesiredAccess: u32,
        dwFileOffsetHigh: u32,
        dwFileOffsetLow: u32,
        dwNumberOfBytesToMap: usize,
    ) -> *mut c_void;

    fn UnmapViewOfFile(lpBaseAddress: *const c_void) -> i32;
}

/// A live read-only view plus the two handles it depends on.
///
/// Drop order matters: the view is unmapped in `drop`, then the fields drop
/// in declaration order, closing the mapping object before the file.
pub(crate) struct PlatformResources {
    view: *mut c_void,
    len: usize,
    _mapping: OwnedHandle,
    _file: File,
}

// SAFETY: the view is mapped with FILE_MAP_READ and only read through shared
// references; the handles are owned and closed exactly once.
unsafe impl Send for PlatformResources {}
// SAFETY: see above.
unsafe impl Sync for PlatformResources {}

impl PlatformResources {
    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.view.cast::<u8>().cast_const()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl Drop for PlatformResources {
    fn drop(&mut self) {
        // SAFETY: view is the base address returned by MapViewOfFile and is
        // unmapped only here.
        if unsafe { UnmapViewOfFile(self.view) } == 0 {
            log::warn!(
                "UnmapViewOfFile of {} bytes failed: {}",
                self.len,
                io::Error::last_os_error()
            );
        } else {
            log::trace!("unmapped {} bytes", self.len);
        }
    }
}

/// Create a read-only mapping object over `file` and map `len` bytes of it.
/// On failure every handle created so far, and `file`, is closed.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn map_read_only(file: File, len: usize) -> io::Result<PlatformResources> {
    let size = len as u64;
    // SAFETY: the file handle is valid for the duration of the call.
    let raw = unsafe {
        CreateFileMappingW(
            file.as_raw_handle(),
            ptr::null(),
            PAGE_READONLY,
            (size >> 32) as u32,
            size as u32,
            ptr::null(),
        )
    };
    if raw.is_null() {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: raw is a freshly created handle that nothing else owns.
    let mapping = unsafe { OwnedHandle::from_raw_handle(raw) };

    // SAFETY: the mapping object is valid and covers at least len bytes.
    let view = unsafe { MapViewOfFile(mapping.as_raw_handle(), FILE_MAP_READ, 0, 0, len) };
    if view.is_null() {
        // Capture the error before `mapping` and `file` are closed on return.
        return Err(io::Error::last_os_error());
    }

    Ok(PlatformResources {
        view,
        len,
        _mapping: mapping,
        _file: file,
    })
}
