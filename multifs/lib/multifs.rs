use std::{
    collections::HashSet,
    fmt::{self, Debug},
    io::Read,
    sync::Arc,
};

use crate::{
    walk::MergedEntries, walk_with_listing, Backend, BackendRef, Capabilities, DirEntry,
    GlobPattern, Metadata, MultiFsError, MultiFsResult, ReadStream, SourceFailure, VirtualPath,
    WalkControl, WalkEntry, FIRST_PRIORITY,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Where a source lands in the priority list when it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Ahead of every registered source
    First,

    /// Behind every registered source
    Last,

    /// At the given position. Positions past the end append.
    Index(usize),
}

/// A read-only view over an ordered list of sources.
///
/// Single-target lookups (`open`, `read_file`, `stat`, `read_dir`) return the answer of the first
/// source, in priority order, that produces one. `glob` unions the matches of every source and
/// `walk` merges the trees of every source, keeping the first source's entry for each path.
///
/// Every operation sanitizes its path once before consulting any source, so `"../a"`, `"/a"` and
/// `"a"` all name the same entry and nothing can climb above a source's root.
///
/// The list has no internal lock. Registration takes `&mut self`; share a `MultiFs` between
/// threads behind a `RwLock` if it must change while in use.
#[derive(Clone, Default)]
pub struct MultiFs {
    sources: Vec<RegisteredSource>,
}

#[derive(Clone)]
struct RegisteredSource {
    backend: BackendRef,
    capabilities: Capabilities,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MultiFs {
    /// Creates an overlay with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `backend` ahead of every other source.
    pub fn add(&mut self, backend: BackendRef) {
        self.insert(backend, Priority::First);
    }

    /// Registers `backend` at `priority`.
    ///
    /// The capability set of the source is read here, once. Registering the same source more
    /// than once is allowed; each registration is a separate entry in the list.
    ///
    /// ## Arguments
    ///
    /// * `backend` - The source to register
    /// * `priority` - A [`Priority`], or an integer where `0` is first and any negative value
    ///   is last
    pub fn insert(&mut self, backend: BackendRef, priority: impl Into<Priority>) {
        let capabilities = backend.capabilities();
        let index = match priority.into() {
            Priority::First => 0,
            Priority::Last => self.sources.len(),
            Priority::Index(index) => index.min(self.sources.len()),
        };

        tracing::debug!(index, %capabilities, "registering source");
        self.sources.insert(
            index,
            RegisteredSource {
                backend,
                capabilities,
            },
        );
    }

    /// Unregisters the first entry holding the same allocation as `backend`.
    ///
    /// ## Returns
    ///
    /// `true` if an entry was removed, `false` if `backend` was not registered.
    pub fn remove(&mut self, backend: &BackendRef) -> bool {
        let position = self
            .sources
            .iter()
            .position(|source| Arc::ptr_eq(&source.backend, backend));

        match position {
            Some(index) => {
                self.sources.remove(index);
                tracing::debug!(index, "removed source");
                true
            }
            None => false,
        }
    }

    /// Returns the number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if no source is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Unregisters every source.
    pub fn clear(&mut self) {
        self.sources.clear();
    }

    /// Returns the registered sources in priority order.
    pub fn backends(&self) -> impl Iterator<Item = &BackendRef> {
        self.sources.iter().map(|source| &source.backend)
    }

    /// Opens the file at `path` in the first source that has it.
    ///
    /// ## Errors
    ///
    /// Returns `NotFound` if no source could open the path. Failures other than a missing path
    /// are listed in the error's causes.
    pub fn open(&self, path: impl AsRef<str>) -> MultiFsResult<ReadStream> {
        let path = VirtualPath::from(path.as_ref());
        self.resolve(&path, Capabilities::empty(), "open", |backend| {
            backend.open(&path)
        })
    }

    /// Reads the whole file at `path` from the first source that has it.
    ///
    /// A source whose stream fails partway counts as not having the file and the scan moves on.
    pub fn read_file(&self, path: impl AsRef<str>) -> MultiFsResult<Vec<u8>> {
        let path = VirtualPath::from(path.as_ref());
        self.resolve(&path, Capabilities::empty(), "read_file", |backend| {
            let mut stream = backend.open(&path)?;
            let mut content = Vec::new();
            stream.read_to_end(&mut content)?;
            Ok(content)
        })
    }

    /// Gets the metadata of `path` from the first source that can stat it.
    pub fn stat(&self, path: impl AsRef<str>) -> MultiFsResult<Metadata> {
        let path = VirtualPath::from(path.as_ref());
        self.resolve(&path, Capabilities::STAT, "stat", |backend| backend.stat(&path))
    }

    /// Lists the directory at `path` in the first source that can list it.
    ///
    /// Entries of other sources are not merged in. The result is sorted by name.
    pub fn read_dir(&self, path: impl AsRef<str>) -> MultiFsResult<Vec<DirEntry>> {
        let path = VirtualPath::from(path.as_ref());
        let mut entries = self.resolve(&path, Capabilities::READ_DIR, "read_dir", |backend| {
            backend.read_dir(&path)
        })?;

        entries.sort_by(|a, b| a.get_name().cmp(b.get_name()));
        Ok(entries)
    }

    /// Returns `true` if any source has an entry at `path`.
    ///
    /// Sources that can stat are asked with `stat`, so directories count. Other sources are asked
    /// with `open`.
    pub fn exists(&self, path: impl AsRef<str>) -> bool {
        let path = VirtualPath::from(path.as_ref());
        self.sources.iter().any(|source| {
            if source.capabilities.contains(Capabilities::STAT) {
                source.backend.stat(&path).is_ok()
            } else {
                source.backend.open(&path).is_ok()
            }
        })
    }

    /// Returns every path matching `pattern` in any source.
    ///
    /// Matches are deduplicated and kept in the order they were first seen, sources taken in
    /// priority order. Sources without native glob are searched through `stat` and `read_dir`.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The pattern is malformed (`InvalidPattern`)
    /// - No source produced any match (`NotFound`)
    pub fn glob(&self, pattern: &str) -> MultiFsResult<Vec<VirtualPath>> {
        let pattern = GlobPattern::new(pattern)?;
        let mut seen = HashSet::new();
        let mut matches = Vec::new();
        let mut causes = Vec::new();

        for (index, source) in self.sources.iter().enumerate() {
            let result = if source.capabilities.contains(Capabilities::GLOB) {
                source.backend.glob(&pattern)
            } else if source.capabilities.can_glob() {
                pattern.expand_with(source.backend.as_ref())
            } else {
                continue;
            };

            match result {
                Ok(found) => {
                    tracing::trace!(index, matches = found.len(), %pattern, "source globbed");
                    for path in found {
                        if seen.insert(path.clone()) {
                            matches.push(path);
                        }
                    }
                }
                Err(error) => Self::record_decline(&mut causes, index, "glob", error),
            }
        }

        if matches.is_empty() {
            return Err(MultiFsError::NotFound {
                path: pattern.get_path().clone(),
                causes,
            });
        }

        Ok(matches)
    }

    /// Walks the merged tree rooted at `root`, root included.
    ///
    /// Every source that can walk is traversed in full before anything is emitted. A path keeps
    /// the entry of the first source that reported it. `visit` then sees each path once, in byte
    /// order, along with its metadata and the error hit while visiting it. Returning
    /// [`WalkControl::SkipDir`] for a directory skips its descendants and
    /// [`WalkControl::Stop`] ends the walk.
    ///
    /// ## Errors
    ///
    /// Returns `NotFound` if no source has `root`.
    pub fn walk<F>(&self, root: impl AsRef<str>, visit: F) -> MultiFsResult<()>
    where
        F: FnMut(&VirtualPath, Option<&Metadata>, Option<&MultiFsError>) -> WalkControl,
    {
        let root = VirtualPath::from(root.as_ref());
        let mut merged = MergedEntries::default();
        let mut causes = Vec::new();

        for (index, source) in self.sources.iter().enumerate() {
            if !source.capabilities.can_walk() {
                continue;
            }

            let mut kept = 0usize;
            let mut sink = |entry: WalkEntry| {
                if merged.insert_first(entry) {
                    kept += 1;
                }
            };

            let result = if source.capabilities.contains(Capabilities::WALK) {
                source.backend.walk(&root, &mut sink)
            } else {
                walk_with_listing(source.backend.as_ref(), &root, &mut sink)
            };

            match result {
                Ok(()) => tracing::trace!(index, kept, %root, "source walked"),
                Err(error) => Self::record_decline(&mut causes, index, "walk", error),
            }
        }

        if merged.is_empty() {
            return Err(MultiFsError::NotFound { path: root, causes });
        }

        tracing::debug!(entries = merged.len(), %root, "emitting merged walk");
        merged.emit(visit);
        Ok(())
    }

    /// Runs `operation` on each source that has `required`, in priority order, until one
    /// succeeds.
    fn resolve<T>(
        &self,
        path: &VirtualPath,
        required: Capabilities,
        name: &'static str,
        mut operation: impl FnMut(&dyn Backend) -> MultiFsResult<T>,
    ) -> MultiFsResult<T> {
        let mut causes = Vec::new();
        for (index, source) in self.sources.iter().enumerate() {
            if !source.capabilities.contains(required) {
                continue;
            }

            match operation(source.backend.as_ref()) {
                Ok(value) => {
                    tracing::trace!(index, operation = name, %path, "resolved");
                    return Ok(value);
                }
                Err(error) => Self::record_decline(&mut causes, index, name, error),
            }
        }

        Err(MultiFsError::NotFound {
            path: path.clone(),
            causes,
        })
    }

    fn record_decline(
        causes: &mut Vec<SourceFailure>,
        index: usize,
        operation: &'static str,
        error: MultiFsError,
    ) {
        if error.is_not_found() {
            return;
        }

        tracing::debug!(index, operation, %error, "source declined");
        causes.push(SourceFailure { index, error });
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<i64> for Priority {
    fn from(value: i64) -> Self {
        match value {
            FIRST_PRIORITY => Priority::First,
            v if v < 0 => Priority::Last,
            v => Priority::Index(usize::try_from(v).unwrap_or(usize::MAX)),
        }
    }
}

impl Debug for MultiFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiFs")
            .field("sources", &self.sources)
            .finish()
    }
}

impl Debug for RegisteredSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredSource")
            .field("address", &Arc::as_ptr(&self.backend).cast::<()>())
            .field("capabilities", &format_args!("{}", self.capabilities))
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
