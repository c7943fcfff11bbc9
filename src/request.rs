//! Mapping requests and the single-shot completion used by the background
//! path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::errors::{MappingError, Result};
use crate::view::MappedView;

/// How a request is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapMode {
    /// Map on the caller's thread and return once the syscalls finish.
    #[default]
    Blocking,
    /// Map on a background worker and report through a completion.
    NonBlocking,
}

/// One call's worth of input. Carries no state across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRequest {
    /// File to map. Not validated beyond what the OS open call enforces.
    pub path: PathBuf,
    /// Execution mode.
    pub mode: MapMode,
}

impl MappingRequest {
    /// Request to be served on the caller's thread.
    pub fn blocking<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode: MapMode::Blocking,
        }
    }

    /// Request to be served by a background worker.
    pub fn non_blocking<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode: MapMode::NonBlocking,
        }
    }
}

/// Observable state of a [`PendingMapping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// The mapping attempt has not returned yet.
    Pending,
    /// The attempt produced a view.
    Completed,
    /// The attempt produced an error.
    Failed,
}

enum RequestState {
    Pending,
    Completed(MappedView),
    Failed(MappingError),
}

struct Slot {
    state: Mutex<RequestState>,
    ready: Condvar,
}

/// Create a linked completer / pending pair for one request.
pub(crate) fn channel(path: &Path) -> (Completer, PendingMapping) {
    let slot = Arc::new(Slot {
        state: Mutex::new(RequestState::Pending),
        ready: Condvar::new(),
    });
    (
        Completer {
            slot: Some(Arc::clone(&slot)),
            path: path.to_path_buf(),
        },
        PendingMapping {
            slot,
            path: path.to_path_buf(),
        },
    )
}

/// Write side of the completion. Consumed by `complete`, so a request can
/// only ever be completed once. Dropping it uncompleted fails the request
/// with an interrupted `MapFailed`.
pub(crate) struct Completer {
    slot: Option<Arc<Slot>>,
    path: PathBuf,
}

impl Completer {
    pub(crate) fn complete(mut self, result: Result<MappedView>) {
        if let Some(slot) = self.slot.take() {
            slot.fill(result);
        }
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            log::warn!(
                "mapping request for {} dropped without a result",
                self.path.display()
            );
            slot.fill(Err(MappingError::interrupted(&self.path)));
        }
    }
}

impl Slot {
    fn fill(&self, result: Result<MappedView>) {
        let mut state = self.state.lock();
        if matches!(*state, RequestState::Pending) {
            *state = match result {
                Ok(view) => RequestState::Completed(view),
                Err(err) => RequestState::Failed(err),
            };
        }
        drop(state);
        self.ready.notify_all();
    }
}

/// Handle to a mapping that runs in the background.
///
/// Moves from `Pending` to exactly one of `Completed` or `Failed`. There is
/// no cancellation: dropping the handle does not stop the attempt, and a view
/// produced for a dropped handle is released as soon as it is delivered.
pub struct PendingMapping {
    slot: Arc<Slot>,
    path: PathBuf,
}

impl PendingMapping {
    /// Path this request maps.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current state, without blocking.
    #[must_use]
    pub fn status(&self) -> RequestStatus {
        match &*self.slot.state.lock() {
            RequestState::Pending => RequestStatus::Pending,
            RequestState::Completed(_) => RequestStatus::Completed,
            RequestState::Failed(_) => RequestStatus::Failed,
        }
    }

    /// Whether the mapping attempt is still running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status() == RequestStatus::Pending
    }

    /// Block until the attempt finishes and take its result.
    ///
    /// # Errors
    ///
    /// Returns the `MappingError` produced by the attempt.
    pub fn wait(self) -> Result<MappedView> {
        let mut state = self.slot.state.lock();
        loop {
            match std::mem::replace(&mut *state, RequestState::Pending) {
                RequestState::Pending => self.slot.ready.wait(&mut state),
                RequestState::Completed(view) => return Ok(view),
                RequestState::Failed(err) => return Err(err),
            }
        }
    }

    /// Like [`wait`](Self::wait), but gives the handle back if the attempt
    /// has not finished within `timeout`. The attempt itself keeps running.
    /// A timeout too large to express as a deadline waits indefinitely.
    ///
    /// # Errors
    ///
    /// The outer `Err` returns the still-pending handle.
    pub fn wait_timeout(self, timeout: Duration) -> std::result::Result<Result<MappedView>, Self> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Ok(self.wait());
        };
        {
            let mut state = self.slot.state.lock();
            loop {
                match std::mem::replace(&mut *state, RequestState::Pending) {
                    RequestState::Pending => {
                        if self.slot.ready.wait_until(&mut state, deadline).timed_out()
                            && matches!(*state, RequestState::Pending)
                        {
                            break;
                        }
                    }
                    RequestState::Completed(view) => return Ok(Ok(view)),
                    RequestState::Failed(err) => return Ok(Err(err)),
                }
            }
        }
        Err(self)
    }

    /// Take the result if the attempt has finished, otherwise return the
    /// handle unchanged.
    ///
    /// # Errors
    ///
    /// The outer `Err` returns the still-pending handle.
    pub fn try_wait(self) -> std::result::Result<Result<MappedView>, Self> {
        self.wait_timeout(Duration::ZERO)
    }
}

impl std::fmt::Debug for PendingMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMapping")
            .field("path", &self.path)
            .field("status", &self.status())
            .finish()
    }
}
