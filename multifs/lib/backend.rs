use std::{
    fmt::{self, Display},
    io::Read,
    ops::{BitOr, BitOrAssign},
    sync::Arc,
};

use getset::Getters;

use crate::{DirEntry, GlobPattern, Metadata, MultiFsError, MultiFsResult, VirtualPath};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A shared handle to a registered source.
///
/// The caller keeps its own clone; the priority list identifies sources by the address of the
/// shared allocation, so removal needs the same `Arc` that was inserted.
pub type BackendRef = Arc<dyn Backend + Send + Sync>;

/// A readable stream returned by [`Backend::open`].
pub type ReadStream = Box<dyn Read + Send>;

/// The set of optional operations a source implements on top of [`Backend::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

/// One entry produced while walking a single source.
#[derive(Debug, Getters)]
#[getset(get = "pub with_prefix")]
pub struct WalkEntry {
    /// The virtual path of the entry
    path: VirtualPath,

    /// The descriptor of the entry, absent when the entry itself could not be inspected
    metadata: Option<Metadata>,

    /// The error hit while visiting the entry, if any
    error: Option<MultiFsError>,
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// A source of named entries that can be registered in a [`MultiFs`](crate::MultiFs).
///
/// Only [`open`](Backend::open) is mandatory. The other operations are optional and a source
/// advertises the ones it implements through [`capabilities`](Backend::capabilities). The overlay
/// reads the capability set once when the source is registered and never calls an operation the
/// set does not contain, so the default bodies only matter for direct callers.
///
/// Every path handed to a source is already sanitized. A source translates the canonical virtual
/// path into whatever addressing it uses natively.
pub trait Backend {
    /// Opens the file at `path` for reading.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The path doesn't exist
    /// - The path is a directory
    fn open(&self, path: &VirtualPath) -> MultiFsResult<ReadStream>;

    /// Returns the optional operations this source implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Gets the metadata of a file or directory.
    fn stat(&self, _path: &VirtualPath) -> MultiFsResult<Metadata> {
        Err(MultiFsError::unsupported("stat"))
    }

    /// Lists the contents of a directory.
    ///
    /// The order of the returned entries is unspecified.
    fn read_dir(&self, _path: &VirtualPath) -> MultiFsResult<Vec<DirEntry>> {
        Err(MultiFsError::unsupported("read_dir"))
    }

    /// Returns the paths matching `pattern`.
    fn glob(&self, _pattern: &GlobPattern) -> MultiFsResult<Vec<VirtualPath>> {
        Err(MultiFsError::unsupported("glob"))
    }

    /// Walks the subtree rooted at `root`, handing every entry to `sink`, root included.
    ///
    /// ## Errors
    ///
    /// Returns `NotFound` if `root` does not exist. Failures below the root are reported through
    /// the entries instead.
    fn walk(&self, _root: &VirtualPath, _sink: &mut dyn FnMut(WalkEntry)) -> MultiFsResult<()> {
        Err(MultiFsError::unsupported("walk"))
    }
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Capabilities {
    /// Direct metadata lookup through [`Backend::stat`].
    pub const STAT: Capabilities = Capabilities(1 << 0);

    /// Directory listing through [`Backend::read_dir`].
    pub const READ_DIR: Capabilities = Capabilities(1 << 1);

    /// Pattern expansion through [`Backend::glob`].
    pub const GLOB: Capabilities = Capabilities(1 << 2);

    /// Recursive traversal through [`Backend::walk`].
    pub const WALK: Capabilities = Capabilities(1 << 3);

    /// Returns the empty set.
    pub const fn empty() -> Self {
        Capabilities(0)
    }

    /// Returns the set of every optional operation.
    pub const fn all() -> Self {
        Capabilities(
            Self::STAT.0 | Self::READ_DIR.0 | Self::GLOB.0 | Self::WALK.0,
        )
    }

    /// Returns `true` if every operation in `other` is in `self`.
    pub const fn contains(&self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the set with every operation in `other` removed.
    pub const fn without(&self, other: Capabilities) -> Self {
        Capabilities(self.0 & !other.0)
    }

    /// Returns `true` if the set is empty.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if a merged walk can cover the source, natively or by driving
    /// `stat` and `read_dir`.
    pub const fn can_walk(&self) -> bool {
        self.contains(Self::WALK) || self.contains(Self::traversal())
    }

    /// Returns `true` if pattern expansion can cover the source, natively or by driving
    /// `stat` and `read_dir`.
    pub const fn can_glob(&self) -> bool {
        self.contains(Self::GLOB) || self.contains(Self::traversal())
    }

    const fn traversal() -> Self {
        Capabilities(Self::STAT.0 | Self::READ_DIR.0)
    }
}

impl WalkEntry {
    /// Creates an entry for a path that was inspected successfully.
    pub fn found(path: VirtualPath, metadata: Metadata) -> Self {
        Self {
            path,
            metadata: Some(metadata),
            error: None,
        }
    }

    /// Creates an entry for a path whose inspection failed.
    pub fn failed(path: VirtualPath, metadata: Option<Metadata>, error: MultiFsError) -> Self {
        Self {
            path,
            metadata,
            error: Some(error),
        }
    }

    /// Splits the entry into its parts.
    pub fn into_parts(self) -> (VirtualPath, Option<Metadata>, Option<MultiFsError>) {
        (self.path, self.metadata, self.error)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        Capabilities(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::STAT, "stat"),
            (Self::READ_DIR, "read_dir"),
            (Self::GLOB, "glob"),
            (Self::WALK, "walk"),
        ];

        let present: Vec<_> = names
            .iter()
            .filter(|(cap, _)| self.contains(*cap))
            .map(|(_, name)| *name)
            .collect();

        write!(f, "open")?;
        for name in present {
            write!(f, "|{}", name)?;
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_contains() {
        let caps = Capabilities::STAT | Capabilities::READ_DIR;
        assert!(caps.contains(Capabilities::STAT));
        assert!(caps.contains(Capabilities::READ_DIR));
        assert!(!caps.contains(Capabilities::GLOB));
        assert!(!caps.contains(Capabilities::STAT | Capabilities::WALK));
        assert!(Capabilities::empty().is_empty());
        assert!(Capabilities::all().contains(caps));
        assert_eq!(caps.without(Capabilities::STAT), Capabilities::READ_DIR);
    }

    #[test]
    fn test_capabilities_derived_operations() {
        let traversal = Capabilities::STAT | Capabilities::READ_DIR;
        assert!(traversal.can_walk());
        assert!(traversal.can_glob());

        assert!(Capabilities::WALK.can_walk());
        assert!(!Capabilities::WALK.can_glob());

        assert!(!Capabilities::STAT.can_walk());
        assert!(!Capabilities::empty().can_glob());
    }

    #[test]
    fn test_capabilities_display() {
        assert_eq!(Capabilities::empty().to_string(), "open");
        assert_eq!(
            (Capabilities::STAT | Capabilities::WALK).to_string(),
            "open|stat|walk"
        );
    }
}
