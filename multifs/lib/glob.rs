//! Glob patterns over virtual paths.
//!
//! Patterns are sanitized like any other path and then matched one segment at a time:
//! - `*` matches any run of characters inside a segment
//! - `?` matches exactly one character inside a segment
//! - `[abc]`, `[a-z]` match one character from the class
//! - `[^a-z]` or `[!a-z]` match one character outside the class
//!
//! No wildcard crosses a `/`.

use std::fmt::{self, Display};

use getset::Getters;
use regex::Regex;

use crate::{sanitize, Backend, MultiFsError, MultiFsResult, VirtualPath};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A compiled glob pattern.
#[derive(Debug, Clone, Getters)]
pub struct GlobPattern {
    /// The pattern as given by the caller
    #[getset(get = "pub with_prefix")]
    source: String,

    /// The sanitized pattern
    #[getset(get = "pub with_prefix")]
    path: VirtualPath,

    segments: Vec<SegmentMatcher>,
}

#[derive(Debug, Clone)]
enum SegmentMatcher {
    Literal(String),
    Wildcard(Regex),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl GlobPattern {
    /// Sanitizes and compiles `pattern`.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidPattern` if a character class is left open or is otherwise malformed.
    pub fn new(pattern: &str) -> MultiFsResult<Self> {
        let path = sanitize(pattern);
        let segments = path
            .segments()
            .map(|segment| SegmentMatcher::compile(pattern, segment))
            .collect::<MultiFsResult<Vec<_>>>()?;

        Ok(Self {
            source: pattern.to_string(),
            path,
            segments,
        })
    }

    /// Returns `true` if any segment contains a wildcard.
    pub fn has_wildcards(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, SegmentMatcher::Wildcard(_)))
    }

    /// Returns `true` if `path` matches the whole pattern.
    pub fn matches(&self, path: &VirtualPath) -> bool {
        let mut segments = path.segments();
        for matcher in &self.segments {
            match segments.next() {
                Some(segment) if matcher.is_match(segment) => {}
                _ => return false,
            }
        }

        segments.next().is_none()
    }

    /// Expands the pattern against a source that can stat and list directories.
    ///
    /// Literal segments are checked with `stat`, wildcard segments with `read_dir`. Directories
    /// that cannot be listed are skipped. Matches come back sorted within each directory.
    pub fn expand_with(&self, backend: &dyn Backend) -> MultiFsResult<Vec<VirtualPath>> {
        if !self.has_wildcards() {
            return Ok(match backend.stat(&self.path) {
                Ok(_) => vec![self.path.clone()],
                Err(_) => Vec::new(),
            });
        }

        let mut frontier = vec![VirtualPath::root()];
        for matcher in &self.segments {
            let mut next = Vec::new();
            for dir in &frontier {
                match matcher {
                    SegmentMatcher::Literal(name) => {
                        let candidate = dir.join_str(name)?;
                        if backend.stat(&candidate).is_ok() {
                            next.push(candidate);
                        }
                    }
                    SegmentMatcher::Wildcard(regex) => {
                        let Ok(mut entries) = backend.read_dir(dir) else {
                            continue;
                        };

                        entries.sort_by(|a, b| a.get_name().cmp(b.get_name()));
                        next.extend(
                            entries
                                .iter()
                                .filter(|e| regex.is_match(e.get_name().as_str()))
                                .map(|e| dir.join(e.get_name())),
                        );
                    }
                }
            }

            if next.is_empty() {
                return Ok(next);
            }

            frontier = next;
        }

        Ok(frontier)
    }
}

impl SegmentMatcher {
    fn compile(pattern: &str, segment: &str) -> MultiFsResult<Self> {
        if !segment.contains(['*', '?', '[']) {
            return Ok(SegmentMatcher::Literal(segment.to_string()));
        }

        let invalid = |reason: &str| MultiFsError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut expr = String::from("^");
        let mut chars = segment.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => expr.push_str("[^/]*"),
                '?' => expr.push_str("[^/]"),
                '[' => {
                    let negated = matches!(chars.peek(), Some('^') | Some('!'));
                    if negated {
                        chars.next();
                    }

                    let mut body = Vec::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) => body.push(c),
                            None => return Err(invalid("unclosed character class")),
                        }
                    }

                    if body.is_empty() {
                        return Err(invalid("empty character class"));
                    }

                    expr.push_str(if negated { "[^/" } else { "[" });
                    let last = body.len() - 1;
                    for (idx, c) in body.iter().enumerate() {
                        if *c == '-' && idx != 0 && idx != last {
                            expr.push('-');
                        } else {
                            expr.push_str(&regex::escape(&c.to_string()));
                        }
                    }
                    expr.push(']');
                }
                c => expr.push_str(&regex::escape(&c.to_string())),
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| invalid(&e.to_string()))?;
        Ok(SegmentMatcher::Wildcard(regex))
    }

    fn is_match(&self, segment: &str) -> bool {
        match self {
            SegmentMatcher::Literal(name) => name == segment,
            SegmentMatcher::Wildcard(regex) => regex.is_match(segment),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryFs;

    #[test]
    fn test_glob_matches_wildcards() {
        let pattern = GlobPattern::new("docs/*.txt").unwrap();
        assert!(pattern.has_wildcards());
        assert!(pattern.matches(&VirtualPath::from("docs/a.txt")));
        assert!(pattern.matches(&VirtualPath::from("docs/.txt")));
        assert!(!pattern.matches(&VirtualPath::from("docs/a.md")));
        assert!(!pattern.matches(&VirtualPath::from("docs/sub/a.txt")));
        assert!(!pattern.matches(&VirtualPath::from("docs")));

        let pattern = GlobPattern::new("file?.rs").unwrap();
        assert!(pattern.matches(&VirtualPath::from("file1.rs")));
        assert!(!pattern.matches(&VirtualPath::from("file10.rs")));
    }

    #[test]
    fn test_glob_matches_character_classes() {
        let pattern = GlobPattern::new("[abc]-[0-9]").unwrap();
        assert!(pattern.matches(&VirtualPath::from("b-7")));
        assert!(!pattern.matches(&VirtualPath::from("d-7")));
        assert!(!pattern.matches(&VirtualPath::from("a-x")));

        let pattern = GlobPattern::new("[^a-c]*").unwrap();
        assert!(pattern.matches(&VirtualPath::from("dog")));
        assert!(!pattern.matches(&VirtualPath::from("cat")));

        let pattern = GlobPattern::new("[!.]*").unwrap();
        assert!(pattern.matches(&VirtualPath::from("visible")));
        assert!(!pattern.matches(&VirtualPath::from(".hidden")));
    }

    #[test]
    fn test_glob_escapes_regex_metacharacters() {
        let pattern = GlobPattern::new("a.(b)+*").unwrap();
        assert!(pattern.matches(&VirtualPath::from("a.(b)+c")));
        assert!(!pattern.matches(&VirtualPath::from("aX(b)+c")));
    }

    #[test]
    fn test_glob_is_sanitized() {
        let pattern = GlobPattern::new("/../docs/./*.txt").unwrap();
        assert_eq!(pattern.get_path().as_str(), "docs/*.txt");
        assert_eq!(pattern.get_source(), "/../docs/./*.txt");
    }

    #[test]
    fn test_glob_invalid_patterns() {
        assert!(matches!(
            GlobPattern::new("[abc"),
            Err(MultiFsError::InvalidPattern { .. })
        ));
        assert!(matches!(
            GlobPattern::new("a/[]"),
            Err(MultiFsError::InvalidPattern { .. })
        ));
        assert!(matches!(
            GlobPattern::new("[z-a]"),
            Err(MultiFsError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_glob_expand_with_listing() {
        let fs = MemoryFs::new()
            .with_file("a/x.txt", "1")
            .unwrap()
            .with_file("a/y.txt", "2")
            .unwrap()
            .with_file("a/z.md", "3")
            .unwrap()
            .with_file("b/x.txt", "4")
            .unwrap();

        let matches = GlobPattern::new("*/x.txt").unwrap().expand_with(&fs).unwrap();
        assert_eq!(matches, vec!["a/x.txt", "b/x.txt"]);

        let matches = GlobPattern::new("a/*.txt").unwrap().expand_with(&fs).unwrap();
        assert_eq!(matches, vec!["a/x.txt", "a/y.txt"]);

        let matches = GlobPattern::new("a/z.md").unwrap().expand_with(&fs).unwrap();
        assert_eq!(matches, vec!["a/z.md"]);

        let matches = GlobPattern::new("c/*").unwrap().expand_with(&fs).unwrap();
        assert!(matches.is_empty());
    }
}
