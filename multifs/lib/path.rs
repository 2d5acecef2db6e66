//! Virtual paths and the sanitizer that produces them.
//!
//! Every path that reaches a source goes through [`sanitize`] first. The result is a
//! [`VirtualPath`]: slash-separated, relative to the logical root, free of `.` and `..`
//! segments. The root itself is the empty path.

use std::{
    borrow::Borrow,
    fmt::{self, Display},
};

use typed_path::{Utf8UnixComponent, Utf8UnixPath};

use crate::{MultiFsResult, PathSegment};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The canonical separator of virtual paths.
pub const SEPARATOR: char = '/';

/// Separators used by host dialects that are folded into [`SEPARATOR`].
const FOREIGN_SEPARATORS: &[char] = &['\\'];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A sanitized, root-relative path inside the merged view.
///
/// Ordering is plain byte ordering of the underlying string, which is the order the merged walk
/// emits entries in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath(String);

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Normalizes an arbitrary caller-supplied path into a [`VirtualPath`].
///
/// Rules:
/// - `""` maps to `""`, the root
/// - `\` is treated as a separator and folded into `/`
/// - redundant separators and `.` segments are dropped
/// - `..` pops the previous segment; at the root it is discarded instead of escaping
/// - a leading `/` is stripped, so absolute paths become root-relative
///
/// This never fails. `"../../etc/passwd"` sanitizes to `"etc/passwd"`.
pub fn sanitize(path: &str) -> VirtualPath {
    if path.is_empty() {
        return VirtualPath::root();
    }

    let unified = path.replace(FOREIGN_SEPARATORS, "/");
    let mut segments: Vec<&str> = Vec::new();
    for component in Utf8UnixPath::new(&unified).components() {
        match component {
            Utf8UnixComponent::RootDir | Utf8UnixComponent::CurDir => {}
            Utf8UnixComponent::ParentDir => {
                segments.pop();
            }
            Utf8UnixComponent::Normal(segment) => {
                if !segment.is_empty() {
                    segments.push(segment);
                }
            }
        }
    }

    VirtualPath(segments.join("/"))
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl VirtualPath {
    /// Returns the root path.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Returns `true` if this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns an iterator over the segments of the path. The root has none.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Returns the last segment of the path, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Returns the parent of the path, or `None` for the root.
    pub fn parent(&self) -> Option<VirtualPath> {
        if self.is_root() {
            return None;
        }

        Some(match self.0.rfind(SEPARATOR) {
            Some(idx) => VirtualPath(self.0[..idx].to_string()),
            None => VirtualPath::root(),
        })
    }

    /// Appends a single validated segment.
    pub fn join(&self, segment: &PathSegment) -> VirtualPath {
        if self.is_root() {
            VirtualPath(segment.as_str().to_string())
        } else {
            VirtualPath(format!("{}/{}", self.0, segment))
        }
    }

    /// Appends a single name, validating it as a segment first.
    pub fn join_str(&self, name: &str) -> MultiFsResult<VirtualPath> {
        let segment = PathSegment::try_from(name)?;
        Ok(self.join(&segment))
    }

    /// Returns `true` if `self` is `ancestor` or lies underneath it.
    pub fn starts_with(&self, ancestor: &VirtualPath) -> bool {
        if ancestor.is_root() || self == ancestor {
            return true;
        }

        self.0
            .strip_prefix(ancestor.as_str())
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }

    /// Returns the remainder of `self` below `ancestor`, or `None` if it is not underneath.
    pub fn strip_prefix(&self, ancestor: &VirtualPath) -> Option<VirtualPath> {
        if !self.starts_with(ancestor) {
            return None;
        }

        if ancestor.is_root() {
            return Some(self.clone());
        }

        let rest = &self.0[ancestor.0.len()..];
        Some(VirtualPath(rest.trim_start_matches(SEPARATOR).to_string()))
    }

    /// Returns `ancestor` followed by every segment of `self`.
    pub fn prefixed_with(&self, ancestor: &VirtualPath) -> VirtualPath {
        match (ancestor.is_root(), self.is_root()) {
            (true, _) => self.clone(),
            (false, true) => ancestor.clone(),
            (false, false) => VirtualPath(format!("{}/{}", ancestor.0, self.0)),
        }
    }

    /// Renders the path with a leading separator, the form used by embedded stores.
    pub fn to_rooted_string(&self) -> String {
        format!("/{}", self.0)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VirtualPath {
    fn from(path: &str) -> Self {
        sanitize(path)
    }
}

impl From<String> for VirtualPath {
    fn from(path: String) -> Self {
        sanitize(&path)
    }
}

impl From<&String> for VirtualPath {
    fn from(path: &String) -> Self {
        sanitize(path)
    }
}

impl From<&VirtualPath> for VirtualPath {
    fn from(path: &VirtualPath) -> Self {
        path.clone()
    }
}

impl From<VirtualPath> for String {
    fn from(path: VirtualPath) -> Self {
        path.0
    }
}

impl AsRef<str> for VirtualPath {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VirtualPath {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for VirtualPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VirtualPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
