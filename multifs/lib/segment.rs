use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::MultiFsError;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Represents a single segment of a virtual path.
///
/// A segment is a non-empty name that contains no separator and is neither `.` nor `..`.
/// Directory listings hand out entry names as segments so that joining them back onto a
/// [`VirtualPath`](crate::VirtualPath) can never escape the parent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathSegment(String);

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PathSegment {
    /// Returns the string representation of the segment.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the bytes representation of the segment.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns the length of the segment in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the segment is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl FromStr for PathSegment {
    type Err = MultiFsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathSegment::try_from(s)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for PathSegment {
    type Error = MultiFsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(MultiFsError::EmptyPathSegment);
        }

        // Both separators are rejected regardless of host, matching the sanitizer.
        if value.contains(['/', '\\']) || value == "." || value == ".." {
            return Err(MultiFsError::InvalidPathComponent(value.to_string()));
        }

        Ok(PathSegment(value.to_string()))
    }
}

impl TryFrom<String> for PathSegment {
    type Error = MultiFsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PathSegment::try_from(value.as_str())
    }
}

impl From<PathSegment> for String {
    #[inline]
    fn from(segment: PathSegment) -> Self {
        segment.0
    }
}

impl AsRef<str> for PathSegment {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<[u8]> for PathSegment {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_as_str() {
        let segment = PathSegment::from_str("example").unwrap();
        assert_eq!(segment.as_str(), "example");
        assert_eq!(segment.as_bytes(), b"example");
        assert_eq!(segment.len(), 7);
        assert_eq!(format!("{}", segment), "example");
    }

    #[test]
    fn test_segment_try_from_str() {
        assert!(PathSegment::try_from("example").is_ok());
        assert!("example".parse::<PathSegment>().is_ok());

        // Negative cases
        assert!(matches!(
            PathSegment::from_str(""),
            Err(MultiFsError::EmptyPathSegment)
        ));
        assert!(PathSegment::from_str(".").is_err());
        assert!(PathSegment::from_str("..").is_err());
        assert!(PathSegment::try_from("/").is_err());
    }

    #[test]
    fn test_segment_normal_with_special_characters() {
        assert!(PathSegment::try_from("file.txt").is_ok());
        assert!(PathSegment::try_from("file-name").is_ok());
        assert!(PathSegment::try_from("file name").is_ok());
        assert!(PathSegment::try_from("file:name").is_ok());
        assert!(PathSegment::try_from("file*name").is_ok());
        assert!(PathSegment::try_from("...").is_ok());
    }

    #[test]
    fn test_segment_with_separators() {
        assert!(PathSegment::try_from("file/name").is_err());
        assert!(PathSegment::try_from("file\\name").is_err());
        assert!(PathSegment::try_from("name/").is_err());
        assert!(PathSegment::try_from("\\name").is_err());
    }
}
