//! Crate-specific error types for mmap-reader.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias for mmap-reader operations.
pub type Result<T> = std::result::Result<T, MappingError>;

/// Which step of the open → size → map sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingErrorKind {
    /// The file could not be opened for reading.
    OpenFailed,
    /// The size of the opened file could not be queried.
    StatFailed,
    /// The read-only mapping could not be created.
    MapFailed,
}

/// Error produced by a single mapping attempt.
///
/// Every variant corresponds to exactly one failed step. By the time a
/// `MappingError` is observable, every handle or descriptor acquired by the
/// attempt has already been released.
#[derive(Debug, Error)]
pub enum MappingError {
    /// File missing, permission denied or invalid path. Nothing was acquired.
    #[error("failed to open file `{}`: {source}", .path.display())]
    OpenFailed {
        /// Path passed by the caller.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Size query failed after a successful open. The file was closed first.
    #[error("failed to get file size `{}`: {source}", .path.display())]
    StatFailed {
        /// Path passed by the caller.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Mapping failed after a successful open and size query, including the
    /// zero-length file case. All handles were closed first.
    #[error("failed to map view of file `{}`: {source}", .path.display())]
    MapFailed {
        /// Path passed by the caller.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl MappingError {
    pub(crate) fn open(path: &Path, source: io::Error) -> Self {
        Self::OpenFailed { path: path.to_path_buf(), source }
    }

    pub(crate) fn stat(path: &Path, source: io::Error) -> Self {
        Self::StatFailed { path: path.to_path_buf(), source }
    }

    pub(crate) fn map(path: &Path, source: io::Error) -> Self {
        Self::MapFailed { path: path.to_path_buf(), source }
    }

    /// The background job ended without producing a result: it was dropped
    /// unrun, or the provider panicked.
    pub(crate) fn interrupted(path: &Path) -> Self {
        Self::map(
            path,
            io::Error::new(
                io::ErrorKind::Interrupted,
                "mapping job ended without a result",
            ),
        )
    }

    /// The three-way classification of this error.
    #[must_use]
    pub fn kind(&self) -> MappingErrorKind {
        match self {
            Self::OpenFailed { .. } => MappingErrorKind::OpenFailed,
            Self::StatFailed { .. } => MappingErrorKind::StatFailed,
            Self::MapFailed { .. } => MappingErrorKind::MapFailed,
        }
    }

    /// Path of the request that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::OpenFailed { path, .. }
            | Self::StatFailed { path, .. }
            | Self::MapFailed { path, .. } => path,
        }
    }

    /// OS error code behind this failure, if the OS reported one.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::OpenFailed { source, .. }
            | Self::StatFailed { source, .. }
            | Self::MapFailed { source, .. } => source.raw_os_error(),
        }
    }
}
