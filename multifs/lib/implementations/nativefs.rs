use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use getset::Getters;
use walkdir::WalkDir;

use crate::{
    Backend, Capabilities, DirEntry, Metadata, MultiFsError, MultiFsResult, PathSegment,
    ReadStream, VirtualPath, WalkEntry,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A source backed by a directory on the host filesystem.
///
/// Virtual paths are joined onto `root_path`. They are sanitized before they get here, so they
/// cannot climb out of the root through `..`.
///
/// `open` and `stat` follow symbolic links. Listings and walks report a link as
/// [`EntityType::Symlink`](crate::EntityType::Symlink) and never descend into it, so links that
/// point back up the tree cannot make a walk loop.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct NativeFs {
    /// The root directory for this filesystem instance
    root_path: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl NativeFs {
    /// Creates a new native filesystem with the given root path.
    ///
    /// The root is not required to exist; lookups against a missing root simply find nothing.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    /// Converts a virtual path to a native filesystem path.
    fn to_native_path(&self, path: &VirtualPath) -> PathBuf {
        path.segments()
            .fold(self.root_path.clone(), |native, segment| native.join(segment))
    }

    /// Gets metadata for a path, following symlinks, mapping a missing path to `NotFound`.
    fn metadata_checked(&self, native: &Path, path: &VirtualPath) -> MultiFsResult<fs::Metadata> {
        fs::metadata(native).map_err(|e| Self::map_io(e, path))
    }

    fn map_io(error: io::Error, path: &VirtualPath) -> MultiFsError {
        match error.kind() {
            io::ErrorKind::NotFound => MultiFsError::not_found(path),
            _ => MultiFsError::Io(error),
        }
    }

    fn list(&self, native: &Path, path: &VirtualPath) -> MultiFsResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(native).map_err(|e| Self::map_io(e, path))? {
            let entry = entry?;

            // Names that are not valid UTF-8 cannot be addressed by a virtual path.
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::trace!(?native, "skipping non utf-8 entry name");
                continue;
            };

            let Ok(segment) = PathSegment::try_from(name) else {
                continue;
            };

            // Links are reported as links, not as their targets.
            let metadata = Metadata::from(&entry.metadata()?);
            entries.push(DirEntry::new(segment, metadata));
        }

        Ok(entries)
    }

    /// Maps a host path under `native_root` back onto the virtual path below `root`.
    ///
    /// Returns `None` for names a virtual path cannot carry.
    fn to_virtual_path(
        root: &VirtualPath,
        native_root: &Path,
        native: &Path,
    ) -> Option<VirtualPath> {
        let relative = native.strip_prefix(native_root).ok()?;
        relative
            .components()
            .try_fold(root.clone(), |path, component| {
                path.join_str(component.as_os_str().to_str()?).ok()
            })
    }

    fn map_walk_error(error: walkdir::Error, path: &VirtualPath) -> MultiFsError {
        match error.into_io_error() {
            Some(e) => Self::map_io(e, path),
            None => MultiFsError::custom(anyhow::anyhow!("filesystem loop at {path}")),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Backend for NativeFs {
    fn open(&self, path: &VirtualPath) -> MultiFsResult<ReadStream> {
        let native_path = self.to_native_path(path);

        let meta = self.metadata_checked(&native_path, path)?;
        if !meta.is_file() {
            return Err(MultiFsError::NotAFile(path.clone()));
        }

        let file = File::open(native_path).map_err(|e| Self::map_io(e, path))?;
        Ok(Box::new(file))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::STAT | Capabilities::READ_DIR | Capabilities::WALK
    }

    fn stat(&self, path: &VirtualPath) -> MultiFsResult<Metadata> {
        let native_path = self.to_native_path(path);
        let metadata = self.metadata_checked(&native_path, path)?;
        Ok(Metadata::from(&metadata))
    }

    fn read_dir(&self, path: &VirtualPath) -> MultiFsResult<Vec<DirEntry>> {
        let native_path = self.to_native_path(path);

        let meta = self.metadata_checked(&native_path, path)?;
        if !meta.is_dir() {
            return Err(MultiFsError::NotADirectory(path.clone()));
        }

        self.list(&native_path, path)
    }

    fn walk(&self, root: &VirtualPath, sink: &mut dyn FnMut(WalkEntry)) -> MultiFsResult<()> {
        let root_metadata = self.stat(root)?;
        let native_root = self.to_native_path(root);

        // A directory is held back until the walker tries to list it, so a listing failure can be
        // reported on the directory's own entry.
        let mut pending: Option<WalkEntry> = None;
        let mut entries = WalkDir::new(&native_root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(next) = entries.next() {
            match next {
                Ok(entry) => {
                    let Some(path) = Self::to_virtual_path(root, &native_root, entry.path()) else {
                        tracing::trace!(native = ?entry.path(), "skipping unaddressable entry");
                        if entry.file_type().is_dir() {
                            entries.skip_current_dir();
                        }
                        continue;
                    };

                    let found = if entry.depth() == 0 {
                        WalkEntry::found(path, root_metadata.clone())
                    } else {
                        match entry.metadata() {
                            Ok(metadata) => WalkEntry::found(path, Metadata::from(&metadata)),
                            Err(e) => {
                                let error = Self::map_walk_error(e, &path);
                                WalkEntry::failed(path, None, error)
                            }
                        }
                    };

                    if let Some(done) = pending.replace(found) {
                        sink(done);
                    }
                }
                Err(e) => {
                    let Some(path) = e
                        .path()
                        .and_then(|native| Self::to_virtual_path(root, &native_root, native))
                    else {
                        tracing::debug!(error = %e, "walk error outside the source root");
                        continue;
                    };

                    tracing::debug!(%path, error = %e, "failed to list directory during walk");
                    let error = Self::map_walk_error(e, &path);
                    match pending.take() {
                        Some(dir) if dir.get_path() == &path => {
                            let (path, metadata, _) = dir.into_parts();
                            sink(WalkEntry::failed(path, metadata, error));
                        }
                        other => {
                            if let Some(done) = other {
                                sink(done);
                            }
                            sink(WalkEntry::failed(path, None, error));
                        }
                    }
                }
            }
        }

        if let Some(done) = pending {
            sink(done);
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
