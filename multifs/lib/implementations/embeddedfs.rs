use std::{
    collections::{BTreeMap, BTreeSet},
    io::Cursor,
    str::FromStr,
};

use crate::{
    sanitize, Backend, Capabilities, DirEntry, EntityType, Metadata, MultiFsError, MultiFsResult,
    PathSegment, ReadStream, VirtualPath,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The key of the root directory in the embedded dialect.
const EMBEDDED_ROOT: &str = "/";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A read-only source over a table of files compiled into the binary.
///
/// Entries are keyed in the embedded dialect, where every path carries a leading `/`. Virtual
/// paths are translated into that form on the way in. Directories are implied by the file paths.
///
/// ```rust
/// use multifs::{Backend, EmbeddedFs, VirtualPath};
///
/// static ASSETS: &[(&str, &[u8])] = &[
///     ("templates/index.html", b"<html></html>"),
///     ("templates/partials/nav.html", b"<nav></nav>"),
/// ];
///
/// let fs = EmbeddedFs::new(ASSETS);
/// assert!(fs.stat(&VirtualPath::from("templates/partials")).unwrap().is_dir());
/// ```
#[derive(Debug, Clone)]
pub struct EmbeddedFs {
    files: BTreeMap<String, &'static [u8]>,
    dirs: BTreeSet<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EmbeddedFs {
    /// Creates an embedded source from `(path, content)` pairs.
    ///
    /// Paths are sanitized; a later pair with the same path replaces an earlier one. Pairs that
    /// sanitize to the root are ignored.
    pub fn new(files: &'static [(&'static str, &'static [u8])]) -> Self {
        let mut table = BTreeMap::new();
        let mut dirs = BTreeSet::from([EMBEDDED_ROOT.to_string()]);

        for (name, content) in files {
            let path = sanitize(name);
            if path.is_root() {
                continue;
            }

            let mut parent = path.parent();
            while let Some(dir) = parent {
                parent = dir.parent();
                dirs.insert(Self::native_key(&dir));
            }

            table.insert(Self::native_key(&path), *content);
        }

        Self { files: table, dirs }
    }

    /// Returns the number of embedded files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no files are embedded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Translates a virtual path into the embedded dialect.
    fn native_key(path: &VirtualPath) -> String {
        path.to_rooted_string()
    }

    /// Returns the parent key and the entry name of a non-root key.
    fn split_key(key: &str) -> Option<(&str, &str)> {
        let idx = key.rfind('/')?;
        let name = &key[idx + 1..];
        if name.is_empty() {
            return None;
        }

        let parent = if idx == 0 { EMBEDDED_ROOT } else { &key[..idx] };
        Some((parent, name))
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Backend for EmbeddedFs {
    fn open(&self, path: &VirtualPath) -> MultiFsResult<ReadStream> {
        let key = Self::native_key(path);
        match self.files.get(&key) {
            Some(content) => Ok(Box::new(Cursor::new(*content))),
            None if self.dirs.contains(&key) => Err(MultiFsError::NotAFile(path.clone())),
            None => Err(MultiFsError::not_found(path)),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::STAT | Capabilities::READ_DIR
    }

    fn stat(&self, path: &VirtualPath) -> MultiFsResult<Metadata> {
        let key = Self::native_key(path);
        if let Some(content) = self.files.get(&key) {
            return Ok(Metadata::new(EntityType::File).with_size(content.len() as u64));
        }

        if self.dirs.contains(&key) {
            return Ok(Metadata::new(EntityType::Directory));
        }

        Err(MultiFsError::not_found(path))
    }

    fn read_dir(&self, path: &VirtualPath) -> MultiFsResult<Vec<DirEntry>> {
        let key = Self::native_key(path);
        if !self.dirs.contains(&key) {
            if self.files.contains_key(&key) {
                return Err(MultiFsError::NotADirectory(path.clone()));
            }
            return Err(MultiFsError::not_found(path));
        }

        let mut entries = Vec::new();
        for dir in &self.dirs {
            if let Some((parent, name)) = Self::split_key(dir) {
                if parent == key {
                    entries.push(DirEntry::new(
                        PathSegment::from_str(name)?,
                        Metadata::new(EntityType::Directory),
                    ));
                }
            }
        }

        for (file, content) in &self.files {
            if let Some((parent, name)) = Self::split_key(file) {
                if parent == key {
                    entries.push(DirEntry::new(
                        PathSegment::from_str(name)?,
                        Metadata::new(EntityType::File).with_size(content.len() as u64),
                    ));
                }
            }
        }

        Ok(entries)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    static TABLE: &[(&str, &[u8])] = &[
        ("embed_dir/A", b"embedded A"),
        ("/embed_dir/sub/B", b"embedded B"),
        ("./root.txt", b"root"),
        ("", b"ignored"),
    ];

    #[test]
    fn test_embeddedfs_keys_use_rooted_dialect() {
        let fs = EmbeddedFs::new(TABLE);
        assert_eq!(fs.len(), 3);
        assert!(fs.files.contains_key("/embed_dir/A"));
        assert!(fs.files.contains_key("/root.txt"));
        assert!(fs.dirs.contains("/"));
        assert!(fs.dirs.contains("/embed_dir"));
        assert!(fs.dirs.contains("/embed_dir/sub"));
    }

    #[test]
    fn test_embeddedfs_open() {
        let fs = EmbeddedFs::new(TABLE);

        let mut content = String::new();
        fs.open(&"embed_dir/sub/B".into())
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "embedded B");

        assert!(matches!(
            fs.open(&"embed_dir".into()),
            Err(MultiFsError::NotAFile(_))
        ));
        assert!(fs.open(&"nope".into()).is_err_and(|e| e.is_not_found()));
    }

    #[test]
    fn test_embeddedfs_stat() {
        let fs = EmbeddedFs::new(TABLE);

        assert!(fs.stat(&VirtualPath::root()).unwrap().is_dir());
        assert!(fs.stat(&"embed_dir/sub".into()).unwrap().is_dir());
        assert_eq!(fs.stat(&"root.txt".into()).unwrap().get_size(), 4);
        assert!(fs.stat(&"embed_dir/C".into()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_embeddedfs_read_dir() {
        let fs = EmbeddedFs::new(TABLE);

        let names: Vec<_> = fs
            .read_dir(&VirtualPath::root())
            .unwrap()
            .iter()
            .map(|e| e.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["embed_dir", "root.txt"]);

        let entries = fs.read_dir(&"embed_dir".into()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.get_name().to_string()).collect();
        assert_eq!(names, vec!["sub", "A"]);
        assert!(entries[0].is_dir());

        assert!(matches!(
            fs.read_dir(&"root.txt".into()),
            Err(MultiFsError::NotADirectory(_))
        ));
        assert!(fs.read_dir(&"missing".into()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_embeddedfs_walk_is_derived() {
        let fs = EmbeddedFs::new(TABLE);
        assert!(!fs.capabilities().contains(Capabilities::WALK));
        assert!(fs.capabilities().can_walk());

        let mut paths = Vec::new();
        crate::walk_with_listing(&fs, &VirtualPath::root(), &mut |entry| {
            paths.push(entry.get_path().to_string())
        })
        .unwrap();
        assert_eq!(
            paths,
            vec!["", "embed_dir", "embed_dir/A", "embed_dir/sub", "embed_dir/sub/B", "root.txt"]
        );
    }
}
