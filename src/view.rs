//! Zero-copy, read-only views over a mapped file.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::platform::PlatformResources;

type ReleaseHook = Box<dyn FnOnce() + Send + Sync + 'static>;

/// Read-only bytes of a file, mapped directly into the address space.
///
/// A `MappedView` is the sole owner of its OS resources. They are released
/// exactly once, when the view is dropped; there is no other way to release
/// them. The length is the file size at mapping time and never changes.
///
/// # Examples
///
/// ```no_run
/// let view = mmap_reader::map_sync("data.bin")?;
/// println!("{} bytes, first = {:?}", view.len(), view.first());
/// // Unmapped here.
/// drop(view);
/// # Ok::<(), mmap_reader::MappingError>(())
/// ```
///
/// Writing to or truncating the file while it is mapped is not guarded
/// against; what the view then observes is up to the OS.
pub struct MappedView {
    // Declared first so it drops first: hooks only observe a completed release.
    resources: PlatformResources,
    hooks: ReleaseHooks,
}

impl MappedView {
    pub(crate) fn new(resources: PlatformResources) -> Self {
        Self {
            resources,
            hooks: ReleaseHooks(Vec::new()),
        }
    }

    /// Address of the first mapped byte.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.resources.as_ptr()
    }

    /// Length in bytes; equal to the file size when it was mapped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Always `false` for views created by this crate, since empty files
    /// cannot be mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The mapped bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the region [ptr, ptr + len) is mapped readable for as long as
        // `self.resources` is alive, which outlives the returned borrow.
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    /// Run `hook` once, after this view's memory and handles are released.
    ///
    /// Hooks attached to the same view run in the order they were attached.
    #[must_use]
    pub fn with_release_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.hooks.0.push(Box::new(hook));
        self
    }

    /// Convert into a clonable handle. The mapping is released when the last
    /// clone is dropped.
    #[must_use]
    pub fn into_shared(self) -> SharedView {
        SharedView(Arc::new(self))
    }
}

impl Deref for MappedView {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for MappedView {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for MappedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedView")
            .field("ptr", &self.as_ptr())
            .field("len", &self.len())
            .finish()
    }
}

struct ReleaseHooks(Vec<ReleaseHook>);

impl Drop for ReleaseHooks {
    fn drop(&mut self) {
        for hook in self.0.drain(..) {
            hook();
        }
    }
}

/// Reference-counted [`MappedView`].
///
/// Cloning is cheap and every clone reads the same memory. Release happens
/// once, when the last clone goes away.
#[derive(Clone)]
pub struct SharedView(Arc<MappedView>);

impl SharedView {
    /// Base address of the mapped region, shared by every clone.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr()
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The mapped bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Number of live clones of this handle.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Recover exclusive ownership if this is the only clone.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when other clones are alive.
    pub fn try_unwrap(self) -> std::result::Result<MappedView, Self> {
        Arc::try_unwrap(self.0).map_err(Self)
    }
}

impl From<MappedView> for SharedView {
    fn from(view: MappedView) -> Self {
        view.into_shared()
    }
}

impl Deref for SharedView {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for SharedView {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for SharedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedView").field(&*self.0).finish()
    }
}
