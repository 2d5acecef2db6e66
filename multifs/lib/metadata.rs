use std::fs;

use chrono::{DateTime, Utc};
use getset::{CopyGetters, Getters, Setters};

use crate::PathSegment;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The kind of an entry in a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// Regular file
    File,

    /// Directory
    Directory,

    /// Symbolic link
    Symlink,
}

/// The descriptor a source reports for one of its entries.
///
/// Only the parts every kind of source can answer are carried: the entry kind, its size and,
/// when the source tracks it, the last modification time.
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters, Getters, Setters)]
pub struct Metadata {
    /// The kind of the entry
    #[getset(get_copy = "pub with_prefix", set = "pub")]
    entity_type: EntityType,

    /// Size of the entry in bytes. Directories report zero unless the source knows better.
    #[getset(get_copy = "pub with_prefix", set = "pub")]
    size: u64,

    /// When the entry was last modified, if the source tracks it
    #[getset(get = "pub with_prefix", set = "pub")]
    modified_at: Option<DateTime<Utc>>,
}

/// A named entry returned by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct DirEntry {
    /// The name of the entry inside its directory
    name: PathSegment,

    /// The descriptor of the entry
    metadata: Metadata,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Metadata {
    /// Creates metadata for an entry of the given kind with zero size and no timestamp.
    ///
    /// ## Examples
    /// ```rust
    /// use multifs::{EntityType, Metadata};
    ///
    /// let metadata = Metadata::new(EntityType::File);
    /// assert_eq!(metadata.get_size(), 0);
    /// assert!(metadata.is_file());
    /// ```
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            size: 0,
            modified_at: None,
        }
    }

    /// Builder-style variant of `set_size`.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Returns `true` if the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.entity_type == EntityType::Directory
    }

    /// Returns `true` if the entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.entity_type == EntityType::File
    }

    /// Returns `true` if the entry is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.entity_type == EntityType::Symlink
    }
}

impl DirEntry {
    /// Creates a new directory entry.
    pub fn new(name: PathSegment, metadata: Metadata) -> Self {
        Self { name, metadata }
    }

    /// Returns `true` if the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<&fs::Metadata> for Metadata {
    fn from(native: &fs::Metadata) -> Self {
        let entity_type = if native.is_dir() {
            EntityType::Directory
        } else if native.is_symlink() {
            EntityType::Symlink
        } else {
            EntityType::File
        };

        Self {
            entity_type,
            size: native.len(),
            modified_at: native.modified().ok().map(DateTime::<Utc>::from),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
