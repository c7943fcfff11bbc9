//! High-level convenience functions.
//!
//! Each call builds its own default [`MapExecutor`]; nothing is shared or
//! cached between calls.

use std::path::Path;

use crate::errors::Result;
use crate::executor::MapExecutor;
use crate::request::PendingMapping;
use crate::view::MappedView;

/// Map the whole file at `path` read-only, on the calling thread.
///
/// # Errors
///
/// Returns `MappingError::OpenFailed`, `StatFailed` or `MapFailed`.
pub fn map_sync<P: AsRef<Path>>(path: P) -> Result<MappedView> {
    MapExecutor::new().map_sync(path)
}

/// Map the whole file at `path` on a background thread and pass the result
/// to `on_complete`, exactly once.
pub fn map_async<P, F>(path: P, on_complete: F)
where
    P: AsRef<Path>,
    F: FnOnce(Result<MappedView>) + Send + 'static,
{
    MapExecutor::new().map_async(path, on_complete);
}

/// Map the whole file at `path` on a background thread and return a handle
/// to wait on.
pub fn map_request<P: AsRef<Path>>(path: P) -> PendingMapping {
    MapExecutor::new().request(path)
}

#[cfg(feature = "async")]
pub mod r#async {
    //! Tokio integration: a blocking-pool task executor and an awaitable
    //! mapping call.
    use std::io;
    use std::path::Path;

    use tokio::runtime::Handle;

    use crate::errors::{MappingError, Result};
    use crate::executor::{Job, TaskExecutor};
    use crate::platform::{MappingProvider, SystemProvider};
    use crate::view::MappedView;

    /// Runs background mapping jobs on a Tokio runtime's blocking pool.
    ///
    /// Once the runtime has shut down, jobs are dropped without running and
    /// [`MapExecutor`](crate::MapExecutor) completes them with an interrupted
    /// `MapFailed`.
    #[derive(Debug, Clone)]
    pub struct TokioExecutor {
        handle: Handle,
    }

    impl TokioExecutor {
        /// Executor bound to the given runtime.
        #[must_use]
        pub fn new(handle: Handle) -> Self {
            Self { handle }
        }

        /// Executor bound to the runtime this is called from, if any.
        #[must_use]
        pub fn try_current() -> Option<Self> {
            Handle::try_current().ok().map(Self::new)
        }
    }

    impl TaskExecutor for TokioExecutor {
        fn execute(&self, job: Job) {
            // Detached; the job reports through its own completion.
            drop(self.handle.spawn_blocking(job));
        }
    }

    /// Map the whole file at `path` on Tokio's blocking pool.
    ///
    /// Must be awaited from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::OpenFailed`, `StatFailed` or `MapFailed`. If the
    /// runtime shuts down before the task runs, `MapFailed` with
    /// `io::ErrorKind::Interrupted` is returned.
    pub async fn map_file_async<P: AsRef<Path>>(path: P) -> Result<MappedView> {
        let path = path.as_ref().to_path_buf();
        let task_path = path.clone();
        match tokio::task::spawn_blocking(move || SystemProvider.map(&task_path)).await {
            Ok(result) => result,
            Err(err) => match err.try_into_panic() {
                Ok(payload) => std::panic::resume_unwind(payload),
                Err(err) => Err(MappingError::map(
                    &path,
                    io::Error::new(io::ErrorKind::Interrupted, err.to_string()),
                )),
            },
        }
    }
}
