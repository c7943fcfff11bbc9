//! # mmap-reader: zero-copy, read-only memory-mapped files
//!
//! Maps a whole file read-only and hands back a [`MappedView`] that reads the
//! file's bytes directly from the page cache. The mapping is released exactly
//! once, when the view (or the last clone of its [`SharedView`]) is dropped.
//!
//! ## Features
//!
//! - **Zero-copy reads**: the view dereferences to `&[u8]` over mapped memory
//! - **Two execution modes**: blocking on the caller's thread, or in the
//!   background with one completion per request
//! - **Deterministic release**: unmap and handle cleanup are a drop effect
//! - **Cross-platform**: `mmap` on Unix, `CreateFileMappingW`/`MapViewOfFile`
//!   on Windows, with one error taxonomy for both
//!
//! ## Quick Start
//!
//! ```no_run
//! use mmap_reader::{map_async, map_sync};
//!
//! let view = map_sync("data.bin")?;
//! assert_eq!(view.len() as u64, std::fs::metadata("data.bin")?.len());
//!
//! map_async("data.bin", |result| match result {
//!     Ok(view) => println!("{} bytes", view.len()),
//!     Err(err) => eprintln!("{err}"),
//! });
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`errors`]: `MappingError` and its three kinds
//! - [`platform`]: the OS mapping provider
//! - [`view`]: `MappedView` and `SharedView`
//! - [`request`]: requests, modes and pending background mappings
//! - [`executor`]: `MapExecutor` and background task executors
//! - [`manager`]: free-function entry points
//!
//! ## Feature Flags
//!
//! - `async`: Tokio executor and `map_file_async`

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]

pub mod errors;
pub mod executor;
pub mod manager;
pub mod platform;
pub mod request;
pub mod view;

pub use errors::{MappingError, MappingErrorKind, Result};
pub use executor::{ExecutorBuilder, Job, MapExecutor, TaskExecutor, ThreadExecutor};
pub use manager::{map_async, map_request, map_sync};
pub use platform::{MappingProvider, SystemProvider};
pub use request::{MapMode, MappingRequest, PendingMapping, RequestStatus};
pub use view::{MappedView, SharedView};

#[cfg(feature = "async")]
pub use manager::r#async::{map_file_async, TokioExecutor};
