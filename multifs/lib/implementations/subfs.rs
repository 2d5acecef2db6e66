use getset::Getters;

use crate::{
    Backend, BackendRef, Capabilities, DirEntry, Metadata, MultiFsResult, ReadStream,
    VirtualPath, WalkEntry,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A view of another source rooted at one of its sub-directories.
///
/// `SubFs::new(assets, "embed_dir")` exposes `embed_dir/logo.png` of `assets` as `logo.png`.
/// The inner source's capabilities carry over, except native glob: patterns are expanded through
/// `stat` and `read_dir` of the view instead, so literal directory names in the prefix are never
/// mistaken for wildcards.
#[derive(Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct SubFs {
    /// The wrapped source
    inner: BackendRef,

    /// The directory of the wrapped source that becomes the root of this view
    prefix: VirtualPath,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SubFs {
    /// Creates a view of `inner` rooted at `prefix`.
    pub fn new(inner: BackendRef, prefix: impl Into<VirtualPath>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    fn to_inner_path(&self, path: &VirtualPath) -> VirtualPath {
        path.prefixed_with(&self.prefix)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Backend for SubFs {
    fn open(&self, path: &VirtualPath) -> MultiFsResult<ReadStream> {
        self.inner.open(&self.to_inner_path(path))
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities().without(Capabilities::GLOB)
    }

    fn stat(&self, path: &VirtualPath) -> MultiFsResult<Metadata> {
        self.inner.stat(&self.to_inner_path(path))
    }

    fn read_dir(&self, path: &VirtualPath) -> MultiFsResult<Vec<DirEntry>> {
        self.inner.read_dir(&self.to_inner_path(path))
    }

    fn walk(&self, root: &VirtualPath, sink: &mut dyn FnMut(WalkEntry)) -> MultiFsResult<()> {
        let prefix = &self.prefix;
        self.inner.walk(&self.to_inner_path(root), &mut |entry| {
            let (path, metadata, error) = entry.into_parts();
            let Some(path) = path.strip_prefix(prefix) else {
                return;
            };

            sink(match error {
                Some(error) => WalkEntry::failed(path, metadata, error),
                None => match metadata {
                    Some(metadata) => WalkEntry::found(path, metadata),
                    None => return,
                },
            });
        })
    }
}

impl std::fmt::Debug for SubFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubFs")
            .field("prefix", &self.prefix)
            .field("capabilities", &self.inner.capabilities())
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
