//! Platform mapping provider: open read-only, query size, map, and the OS
//! resources that have to outlive the mapping.
//!
//! The sequence is the same everywhere. What differs is which resources must
//! stay alive until unmap:
//!
//! - **Unix** (descriptor-based): none. The descriptor is closed right after
//!   `mmap` returns.
//! - **Windows** (handle-based): the file handle and the file-mapping object,
//!   closed after `UnmapViewOfFile`.
//!
//! That difference is captured entirely by the per-platform
//! `PlatformResources` type, which releases everything in its `Drop`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use crate::errors::{MappingError, Result};
use crate::view::MappedView;

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        mod windows;
        use windows as os;
    } else if #[cfg(unix)] {
        mod unix;
        use unix as os;
    } else {
        compile_error!("mmap-reader supports unix and windows targets only");
    }
}

pub(crate) use os::PlatformResources;

// Error message constants
const ERR_ZERO_LENGTH_FILE: &str = "cannot map zero-length file";
const ERR_TOO_LARGE: &str = "file size exceeds the addressable range";

/// Something that can turn a path into a read-only [`MappedView`].
///
/// [`SystemProvider`] is the real implementation. The trait exists so that
/// [`MapExecutor`](crate::MapExecutor) can be driven by wrappers, for example
/// one that attaches release hooks to every view it hands out.
pub trait MappingProvider: Send + Sync + 'static {
    /// Map the entire current contents of `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::OpenFailed`, `StatFailed` or `MapFailed` for the
    /// step that failed. Nothing stays acquired when an error is returned.
    fn map(&self, path: &Path) -> Result<MappedView>;
}

/// The operating system's mapping primitives.
///
/// Each call opens its own file handle and produces an independent mapping;
/// there is no caching between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProvider;

impl MappingProvider for SystemProvider {
    fn map(&self, path: &Path) -> Result<MappedView> {
        let file = open_read_only(path).map_err(|e| MappingError::open(path, e))?;

        // From here on, returning early drops `file` and closes it.
        let size = file
            .metadata()
            .map_err(|e| MappingError::stat(path, e))?
            .len();
        let len = mappable_len(size).map_err(|e| MappingError::map(path, e))?;

        let resources = os::map_read_only(file, len).map_err(|e| MappingError::map(path, e))?;
        log::debug!("mapped {} ({} bytes)", path.display(), len);
        Ok(MappedView::new(resources))
    }
}

fn open_read_only(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).open(path)
}

/// Validate a file size as a mapping length. Zero is rejected on every
/// platform so that an empty file fails the same way everywhere.
fn mappable_len(size: u64) -> io::Result<usize> {
    if size == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, ERR_ZERO_LENGTH_FILE));
    }
    usize::try_from(size).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, ERR_TOO_LARGE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MappingErrorKind;
    use std::io::Write;

    #[test]
    fn zero_size_is_rejected() {
        let err = mappable_len(0).expect_err("zero");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(mappable_len(3).expect("three"), 3);
    }

    #[test]
    fn maps_whole_file() {
        let mut f = tempfile::NamedTempFile::new().expect("tmp");
        f.write_all(b"ABC").expect("write");
        f.flush().expect("flush");

        let view = SystemProvider.map(f.path()).expect("map");
        assert_eq!(view.len(), 3);
        assert_eq!(view.as_slice(), &[0x41, 0x42, 0x43]);
    }

    #[test]
    fn missing_file_is_open_failed() {
        let dir = tempfile::tempdir().expect("dir");
        let err = SystemProvider
            .map(&dir.path().join("missing.bin"))
            .expect_err("missing");
        assert_eq!(err.kind(), MappingErrorKind::OpenFailed);
    }

    #[test]
    fn empty_file_is_map_failed() {
        let f = tempfile::NamedTempFile::new().expect("tmp");
        let err = SystemProvider.map(f.path()).expect_err("empty");
        assert_eq!(err.kind(), MappingErrorKind::MapFailed);
        assert!(err.to_string().contains(ERR_ZERO_LENGTH_FILE));
    }

    #[test]
    fn independent_mappings_of_same_file() {
        let mut f = tempfile::NamedTempFile::new().expect("tmp");
        f.write_all(b"shared bytes").expect("write");
        f.flush().expect("flush");

        let a = SystemProvider.map(f.path()).expect("a");
        let b = SystemProvider.map(f.path()).expect("b");
        assert_ne!(a.as_ptr(), b.as_ptr());
        drop(a);
        assert_eq!(b.as_slice(), b"shared bytes");
    }
}
