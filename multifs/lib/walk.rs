//! Recursive traversal of single sources and the buffer that merges them.

use std::collections::{btree_map, BTreeMap};

use crate::{Backend, Metadata, MultiFsError, MultiFsResult, VirtualPath, WalkEntry};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// What the merged walk should do after a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkControl {
    /// Keep emitting entries
    #[default]
    Continue,

    /// Skip the descendants of the visited directory; same as `Continue` for anything else
    SkipDir,

    /// Stop emitting entries
    Stop,
}

/// Entries collected from every source, keyed and ordered by path.
///
/// A path keeps the entry of the first source that reported it.
#[derive(Debug, Default)]
pub(crate) struct MergedEntries {
    entries: BTreeMap<VirtualPath, (Option<Metadata>, Option<MultiFsError>)>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MergedEntries {
    /// Records `entry` unless its path is already taken. Returns whether it was recorded.
    pub(crate) fn insert_first(&mut self, entry: WalkEntry) -> bool {
        let (path, metadata, error) = entry.into_parts();
        match self.entries.entry(path) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert((metadata, error));
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hands every entry to `visit` in byte order of the paths until it asks to stop.
    pub(crate) fn emit<F>(self, mut visit: F)
    where
        F: FnMut(&VirtualPath, Option<&Metadata>, Option<&MultiFsError>) -> WalkControl,
    {
        // Descendants of a skipped directory are not contiguous in byte order ("a-c" sorts
        // between "a" and "a/b"), so every skipped directory stays in the list.
        let mut skipped: Vec<&VirtualPath> = Vec::new();
        for (path, (metadata, error)) in &self.entries {
            if skipped.iter().any(|dir| path.starts_with(dir)) {
                continue;
            }

            match visit(path, metadata.as_ref(), error.as_ref()) {
                WalkControl::Continue => {}
                WalkControl::SkipDir => {
                    if metadata.as_ref().is_some_and(Metadata::is_dir) {
                        skipped.push(path);
                    }
                }
                WalkControl::Stop => break,
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Walks a source that has no native walk by driving its `stat` and `read_dir`.
///
/// A directory that cannot be listed is reported once, with its metadata and the listing error.
pub fn walk_with_listing(
    backend: &dyn Backend,
    root: &VirtualPath,
    sink: &mut dyn FnMut(WalkEntry),
) -> MultiFsResult<()> {
    let metadata = backend.stat(root)?;
    descend(backend, root.clone(), metadata, sink);
    Ok(())
}

fn descend(
    backend: &dyn Backend,
    path: VirtualPath,
    metadata: Metadata,
    sink: &mut dyn FnMut(WalkEntry),
) {
    if !metadata.is_dir() {
        sink(WalkEntry::found(path, metadata));
        return;
    }

    match backend.read_dir(&path) {
        Ok(mut entries) => {
            sink(WalkEntry::found(path.clone(), metadata));
            entries.sort_by(|a, b| a.get_name().cmp(b.get_name()));
            for entry in entries {
                let child = path.join(entry.get_name());
                descend(backend, child, entry.get_metadata().clone(), sink);
            }
        }
        Err(e) => sink(WalkEntry::failed(path, Some(metadata), e)),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityType, MemoryFs};

    #[test]
    fn test_merged_entries_first_wins() {
        let mut merged = MergedEntries::default();
        let first = Metadata::new(EntityType::File).with_size(1);
        let second = Metadata::new(EntityType::File).with_size(2);

        assert!(merged.insert_first(WalkEntry::found("y".into(), first)));
        assert!(!merged.insert_first(WalkEntry::found("y".into(), second)));
        assert_eq!(merged.len(), 1);

        let mut seen = Vec::new();
        merged.emit(|path, metadata, _| {
            seen.push((path.to_string(), metadata.map(|m| m.get_size())));
            WalkControl::Continue
        });
        assert_eq!(seen, vec![("y".to_string(), Some(1))]);
    }

    #[test]
    fn test_merged_entries_sorted_emission() {
        let mut merged = MergedEntries::default();
        for name in ["z", "a/b", "a", "a-c", ""] {
            merged.insert_first(WalkEntry::found(name.into(), Metadata::new(EntityType::File)));
        }

        let mut seen = Vec::new();
        merged.emit(|path, _, _| {
            seen.push(path.to_string());
            WalkControl::Continue
        });
        assert_eq!(seen, vec!["", "a", "a-c", "a/b", "z"]);
    }

    #[test]
    fn test_merged_entries_stop_and_skip() {
        let build = || {
            let mut merged = MergedEntries::default();
            merged.insert_first(WalkEntry::found("a".into(), Metadata::new(EntityType::Directory)));
            merged.insert_first(WalkEntry::found("a/1".into(), Metadata::new(EntityType::File)));
            merged.insert_first(WalkEntry::found("a/2".into(), Metadata::new(EntityType::File)));
            merged.insert_first(WalkEntry::found("a-c".into(), Metadata::new(EntityType::File)));
            merged.insert_first(WalkEntry::found("b".into(), Metadata::new(EntityType::File)));
            merged
        };

        let mut seen = Vec::new();
        build().emit(|path, _, _| {
            seen.push(path.to_string());
            if path == "a" {
                WalkControl::SkipDir
            } else {
                WalkControl::Continue
            }
        });
        assert_eq!(seen, vec!["a", "a-c", "b"]);

        let mut seen = Vec::new();
        build().emit(|path, _, _| {
            seen.push(path.to_string());
            if path == "a/1" {
                WalkControl::Stop
            } else {
                WalkControl::Continue
            }
        });
        assert_eq!(seen, vec!["a", "a-c", "a/1"]);
    }

    #[test]
    fn test_walk_with_listing() {
        let fs = MemoryFs::new()
            .with_file("docs/readme.md", "hi")
            .unwrap()
            .with_file("docs/guide/intro.md", "intro")
            .unwrap()
            .with_file("top.txt", "top")
            .unwrap();

        let mut paths = Vec::new();
        walk_with_listing(&fs, &VirtualPath::from("docs"), &mut |entry| {
            paths.push(entry.get_path().to_string())
        })
        .unwrap();
        assert_eq!(
            paths,
            vec!["docs", "docs/guide", "docs/guide/intro.md", "docs/readme.md"]
        );

        let err = walk_with_listing(&fs, &VirtualPath::from("missing"), &mut |_| {}).unwrap_err();
        assert!(err.is_not_found());
    }
}
