//! Mapping request executor: the blocking and background entry points.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::errors::{MappingError, Result};
use crate::platform::{MappingProvider, SystemProvider};
use crate::request::{self, MapMode, MappingRequest, PendingMapping};
use crate::view::MappedView;

// Default name for background mapping threads
const DEFAULT_THREAD_NAME: &str = "mmap-reader";

/// A unit of background work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs somewhere other than the calling thread.
///
/// Implementations must not fail synchronously and must run every job they
/// accept exactly once.
pub trait TaskExecutor: Send + Sync + 'static {
    /// Schedule `job`.
    fn execute(&self, job: Job);
}

/// Spawns one detached, named OS thread per job.
#[derive(Debug, Clone)]
pub struct ThreadExecutor {
    name: String,
    stack_size: Option<usize>,
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self {
            name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
        }
    }
}

impl TaskExecutor for ThreadExecutor {
    fn execute(&self, job: Job) {
        // Shared so the job can be recovered if the thread never starts.
        let slot = Arc::new(Mutex::new(Some(job)));
        let worker_slot = Arc::clone(&slot);

        let mut builder = thread::Builder::new().name(self.name.clone());
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        let spawned = builder.spawn(move || {
            let job = worker_slot.lock().take();
            if let Some(job) = job {
                job();
            }
        });

        if let Err(err) = spawned {
            log::warn!("failed to spawn mapping thread, running inline: {err}");
            let job = slot.lock().take();
            if let Some(job) = job {
                job();
            }
        }
    }
}

/// Drives a [`MappingProvider`] in either execution mode.
///
/// # Examples
///
/// ```no_run
/// use mmap_reader::MapExecutor;
///
/// let executor = MapExecutor::new();
///
/// // Blocking
/// let view = executor.map_sync("data.bin")?;
///
/// // Background, result delivered to a callback
/// executor.map_async("data.bin", |result| match result {
///     Ok(view) => println!("mapped {} bytes", view.len()),
///     Err(err) => eprintln!("{err}"),
/// });
///
/// // Background, result collected later
/// let pending = executor.request("data.bin");
/// let same = pending.wait()?;
/// assert_eq!(view.as_slice(), same.as_slice());
/// # Ok::<(), mmap_reader::MappingError>(())
/// ```
pub struct MapExecutor<P = SystemProvider, E = ThreadExecutor> {
    provider: Arc<P>,
    executor: E,
}

impl MapExecutor {
    /// Executor over the OS provider with default background threads.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(SystemProvider, ThreadExecutor::default())
    }

    /// Configure an executor.
    #[must_use]
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }
}

impl Default for MapExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: MappingProvider, E: TaskExecutor> MapExecutor<P, E> {
    /// Assemble an executor from a provider and a task executor.
    pub fn with_parts(provider: P, executor: E) -> Self {
        Self {
            provider: Arc::new(provider),
            executor,
        }
    }

    /// The provider used for every request.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Map `path` on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns the provider's `MappingError` for the step that failed.
    pub fn map_sync<Q: AsRef<Path>>(&self, path: Q) -> Result<MappedView> {
        self.provider.map(path.as_ref())
    }

    /// Map `path` in the background and hand the result to `on_complete`.
    ///
    /// Returns immediately. `on_complete` runs exactly once, on the worker,
    /// after the mapping attempt has returned. If the task executor drops the
    /// job without running it, or the provider panics, `on_complete` receives
    /// a `MapFailed` error of kind [`Interrupted`](std::io::ErrorKind::Interrupted)
    /// from wherever the job is dropped.
    pub fn map_async<Q, F>(&self, path: Q, on_complete: F)
    where
        Q: AsRef<Path>,
        F: FnOnce(Result<MappedView>) + Send + 'static,
    {
        let provider = Arc::clone(&self.provider);
        let completion = Completion {
            path: path.as_ref().to_path_buf(),
            callback: Some(on_complete),
        };
        self.executor.execute(Box::new(move || {
            let result = provider.map(&completion.path);
            if let Err(err) = &result {
                log::debug!("background mapping failed: {err}");
            }
            completion.deliver(result);
        }));
    }

    /// Map `path` in the background and return a handle to collect the
    /// result from the calling thread.
    pub fn request<Q: AsRef<Path>>(&self, path: Q) -> PendingMapping {
        let (completer, pending) = request::channel(path.as_ref());
        self.map_async(path, move |result| completer.complete(result));
        pending
    }

    /// Serve `request` in its own mode. Blocking requests complete before this
    /// returns; non-blocking ones complete later on a worker.
    pub fn submit<F>(&self, request: MappingRequest, on_complete: F)
    where
        F: FnOnce(Result<MappedView>) + Send + 'static,
    {
        match request.mode {
            MapMode::Blocking => on_complete(self.map_sync(&request.path)),
            MapMode::NonBlocking => self.map_async(request.path, on_complete),
        }
    }
}

impl<P, E: std::fmt::Debug> std::fmt::Debug for MapExecutor<P, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapExecutor")
            .field("provider", &std::any::type_name::<P>())
            .field("executor", &self.executor)
            .finish()
    }
}

// Delivers to the callback once, even if the job carrying it never runs.
struct Completion<F: FnOnce(Result<MappedView>)> {
    path: PathBuf,
    callback: Option<F>,
}

impl<F: FnOnce(Result<MappedView>)> Completion<F> {
    fn deliver(mut self, result: Result<MappedView>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl<F: FnOnce(Result<MappedView>)> Drop for Completion<F> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            log::warn!(
                "background mapping of {} ended without a result",
                self.path.display()
            );
            callback(Err(MappingError::interrupted(&self.path)));
        }
    }
}

/// Builder for [`MapExecutor`].
///
/// ```no_run
/// use mmap_reader::MapExecutor;
///
/// let executor = MapExecutor::builder()
///     .thread_name("loader")
///     .stack_size(256 * 1024)
///     .build();
/// let view = executor.request("data.bin").wait()?;
/// # Ok::<(), mmap_reader::MappingError>(())
/// ```
#[derive(Debug)]
pub struct ExecutorBuilder<P = SystemProvider> {
    provider: P,
    threads: ThreadExecutor,
}

impl ExecutorBuilder {
    /// Builder with the OS provider and default thread settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: SystemProvider,
            threads: ThreadExecutor::default(),
        }
    }
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: MappingProvider> ExecutorBuilder<P> {
    /// Use a different mapping provider.
    pub fn provider<Q: MappingProvider>(self, provider: Q) -> ExecutorBuilder<Q> {
        ExecutorBuilder {
            provider,
            threads: self.threads,
        }
    }

    /// Name given to background mapping threads.
    #[must_use]
    pub fn thread_name<S: Into<String>>(mut self, name: S) -> Self {
        self.threads.name = name.into();
        self
    }

    /// Stack size, in bytes, of background mapping threads.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.threads.stack_size = Some(bytes);
        self
    }

    /// Build with a thread-per-request background executor.
    pub fn build(self) -> MapExecutor<P, ThreadExecutor> {
        MapExecutor::with_parts(self.provider, self.threads)
    }

    /// Build with a caller-supplied background executor. Thread settings are
    /// ignored.
    pub fn build_with<E: TaskExecutor>(self, executor: E) -> MapExecutor<P, E> {
        MapExecutor::with_parts(self.provider, executor)
    }
}
