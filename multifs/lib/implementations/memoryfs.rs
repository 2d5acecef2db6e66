use std::{collections::BTreeMap, io::Cursor, str::FromStr, sync::Arc};

use chrono::Utc;
use getset::Getters;

use crate::{
    Backend, Capabilities, DirEntry, EntityType, GlobPattern, Metadata, MultiFsError,
    MultiFsResult, PathSegment, ReadStream, VirtualPath, WalkEntry,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An in-memory source.
///
/// The tree is populated up front through `&mut self` (or the `with_*` builder methods) and is
/// read-only once shared with an overlay. Useful for tests and for layering generated content
/// over on-disk directories.
#[derive(Debug, Clone, Default, Getters)]
#[getset(get = "pub with_prefix")]
pub struct MemoryFs {
    /// The root directory of the file system
    root_dir: Dir,
}

/// Represents a directory in the memory file system.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Dir {
    /// Metadata associated with the directory
    metadata: Metadata,

    /// Map of path segments to directory entries
    entries: BTreeMap<PathSegment, Entity>,
}

/// Represents a file in the memory file system.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct File {
    /// Metadata associated with the file
    metadata: Metadata,

    /// Content of the file
    content: Arc<[u8]>,
}

/// Represents an entity in the memory file system.
#[derive(Debug, Clone)]
pub enum Entity {
    /// A directory containing other entities
    Dir(Dir),

    /// A file containing data
    File(File),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MemoryFs {
    /// Creates a new empty memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a file holding `content` at `path`, creating missing parent directories.
    ///
    /// An existing file at `path` is replaced.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - `path` is the root or an existing directory (`NotAFile`)
    /// - A parent component is a file (`NotADirectory`)
    pub fn create_file(
        &mut self,
        path: impl Into<VirtualPath>,
        content: impl Into<Vec<u8>>,
    ) -> MultiFsResult<()> {
        let path = path.into();
        let (parent, name) = Self::split_path(&path)?;
        let dir = self.root_dir.ensure_dir(&parent)?;

        if let Some(Entity::Dir(_)) = dir.entries.get(&name) {
            return Err(MultiFsError::NotAFile(path));
        }

        dir.entries
            .insert(name, Entity::File(File::with_content(content.into())));
        Ok(())
    }

    /// Creates a directory at `path` along with missing parents. Existing directories are kept.
    ///
    /// ## Errors
    ///
    /// Returns `NotADirectory` if `path` or one of its parents is a file.
    pub fn create_directory(&mut self, path: impl Into<VirtualPath>) -> MultiFsResult<()> {
        self.root_dir.ensure_dir(&path.into()).map(|_| ())
    }

    /// Builder-style variant of [`create_file`](Self::create_file).
    pub fn with_file(
        mut self,
        path: impl Into<VirtualPath>,
        content: impl Into<Vec<u8>>,
    ) -> MultiFsResult<Self> {
        self.create_file(path, content)?;
        Ok(self)
    }

    /// Builder-style variant of [`create_directory`](Self::create_directory).
    pub fn with_directory(mut self, path: impl Into<VirtualPath>) -> MultiFsResult<Self> {
        self.create_directory(path)?;
        Ok(self)
    }

    /// Looks up the entity at `path`.
    pub fn find(&self, path: &VirtualPath) -> MultiFsResult<Option<&Entity>> {
        self.root_dir.find(path)
    }

    /// Splits the given path into its parent and the last path segment.
    #[inline]
    fn split_path(path: &VirtualPath) -> MultiFsResult<(VirtualPath, PathSegment)> {
        let name = path
            .file_name()
            .ok_or_else(|| MultiFsError::NotAFile(path.clone()))?;
        let parent = path.parent().unwrap_or_default();
        Ok((parent, PathSegment::from_str(name)?))
    }

    fn find_existing(&self, path: &VirtualPath) -> MultiFsResult<&Entity> {
        self.find(path)?
            .ok_or_else(|| MultiFsError::not_found(path))
    }

    fn walk_entity(
        path: VirtualPath,
        entity: &Entity,
        sink: &mut dyn FnMut(WalkEntry),
    ) {
        sink(WalkEntry::found(path.clone(), entity.get_metadata().clone()));
        if let Entity::Dir(dir) = entity {
            for (name, child) in &dir.entries {
                Self::walk_entity(path.join(name), child, sink);
            }
        }
    }
}

impl File {
    /// Creates a new file with the given content.
    pub fn with_content(content: Vec<u8>) -> Self {
        let mut metadata = Metadata::new(EntityType::File).with_size(content.len() as u64);
        metadata.set_modified_at(Some(Utc::now()));

        Self {
            metadata,
            content: content.into(),
        }
    }
}

impl Entity {
    /// Returns the metadata of the entity.
    pub fn get_metadata(&self) -> &Metadata {
        match self {
            Entity::Dir(dir) => &dir.metadata,
            Entity::File(file) => &file.metadata,
        }
    }
}

impl Dir {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        let mut metadata = Metadata::new(EntityType::Directory);
        metadata.set_modified_at(Some(Utc::now()));

        Self {
            metadata,
            entries: BTreeMap::new(),
        }
    }

    /// Retrieves an entity from the directory's entries using the given path segment.
    pub fn get(&self, name: &PathSegment) -> Option<&Entity> {
        self.entries.get(name)
    }

    /// Traverses `path` starting from this directory.
    ///
    /// ## Returns
    ///
    /// * `Ok(Some(&Entity))` - The entity at `path`; the root is never returned this way
    /// * `Ok(None)` - If the path doesn't exist
    /// * `Err(MultiFsError::NotADirectory)` - If a non-final path component isn't a directory
    pub fn find(&self, path: &VirtualPath) -> MultiFsResult<Option<&Entity>> {
        let mut segments = path.segments().peekable();
        let mut current_dir = self;

        while let Some(segment) = segments.next() {
            let entry = current_dir.get(&PathSegment::from_str(segment)?);

            if segments.peek().is_none() {
                return Ok(entry);
            }

            match entry {
                Some(Entity::Dir(dir)) => current_dir = dir,
                Some(Entity::File(_)) => return Err(MultiFsError::NotADirectory(path.clone())),
                None => return Ok(None),
            }
        }

        Ok(None)
    }

    /// Walks `path` from this directory, creating directories that are missing.
    fn ensure_dir(&mut self, path: &VirtualPath) -> MultiFsResult<&mut Dir> {
        let mut current_dir = self;
        for segment in path.segments() {
            let entity = current_dir
                .entries
                .entry(PathSegment::from_str(segment)?)
                .or_insert_with(|| Entity::Dir(Dir::new()));

            current_dir = match entity {
                Entity::Dir(dir) => dir,
                Entity::File(_) => return Err(MultiFsError::NotADirectory(path.clone())),
            };
        }

        Ok(current_dir)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Dir {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryFs {
    fn open(&self, path: &VirtualPath) -> MultiFsResult<ReadStream> {
        if path.is_root() {
            return Err(MultiFsError::NotAFile(path.clone()));
        }

        match self.find_existing(path)? {
            Entity::File(file) => Ok(Box::new(Cursor::new(Arc::clone(&file.content)))),
            Entity::Dir(_) => Err(MultiFsError::NotAFile(path.clone())),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn stat(&self, path: &VirtualPath) -> MultiFsResult<Metadata> {
        if path.is_root() {
            return Ok(self.root_dir.metadata.clone());
        }

        Ok(self.find_existing(path)?.get_metadata().clone())
    }

    fn read_dir(&self, path: &VirtualPath) -> MultiFsResult<Vec<DirEntry>> {
        let dir = if path.is_root() {
            &self.root_dir
        } else {
            match self.find_existing(path)? {
                Entity::Dir(dir) => dir,
                Entity::File(_) => return Err(MultiFsError::NotADirectory(path.clone())),
            }
        };

        Ok(dir
            .entries
            .iter()
            .map(|(name, entity)| DirEntry::new(name.clone(), entity.get_metadata().clone()))
            .collect())
    }

    fn glob(&self, pattern: &GlobPattern) -> MultiFsResult<Vec<VirtualPath>> {
        let mut matches = Vec::new();
        self.walk(&VirtualPath::root(), &mut |entry| {
            if pattern.matches(entry.get_path()) {
                matches.push(entry.get_path().clone());
            }
        })?;

        Ok(matches)
    }

    fn walk(&self, root: &VirtualPath, sink: &mut dyn FnMut(WalkEntry)) -> MultiFsResult<()> {
        if root.is_root() {
            sink(WalkEntry::found(root.clone(), self.root_dir.metadata.clone()));
            for (name, child) in &self.root_dir.entries {
                Self::walk_entity(root.join(name), child, sink);
            }
            return Ok(());
        }

        let entity = self.find_existing(root)?;
        Self::walk_entity(root.clone(), entity, sink);
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
