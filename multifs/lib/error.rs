use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use thiserror::Error;

use crate::VirtualPath;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a multifs operation.
pub type MultiFsResult<T> = Result<T, MultiFsError>;

/// An error that occurred during a multifs operation.
#[derive(pretty_error_debug::Debug, Error)]
pub enum MultiFsError {
    /// No registered source produced a result for the path or pattern.
    ///
    /// `causes` holds the failures of sources that declined for a reason other than the path
    /// being absent. It is empty when every source simply did not have the path.
    #[error("path does not exist in any source: {path}")]
    NotFound {
        /// The sanitized path or pattern that was looked up
        path: VirtualPath,

        /// The non-`NotFound` failures reported by individual sources
        causes: Vec<SourceFailure>,
    },

    /// The path is not a directory
    #[error("path is not a directory: {0}")]
    NotADirectory(VirtualPath),

    /// The path is not a file
    #[error("path is not a file: {0}")]
    NotAFile(VirtualPath),

    /// The source does not implement the requested operation
    #[error("operation not supported by source: {operation}")]
    Unsupported {
        /// The name of the missing operation
        operation: &'static str,
    },

    /// The glob pattern is malformed
    #[error("invalid glob pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The pattern as given by the caller
        pattern: String,

        /// Why the pattern was rejected
        reason: String,
    },

    /// Empty path segment
    #[error("empty path segment")]
    EmptyPathSegment,

    /// Invalid path component (e.g. ".", "..", "/")
    #[error("invalid path component: {0}")]
    InvalidPathComponent(String),

    /// The configuration is invalid
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration file could not be parsed
    #[error("failed to parse configuration file {}: {source}", .path.display())]
    ConfigParse {
        /// The path of the configuration file
        path: PathBuf,

        /// The underlying parse error
        source: toml::de::Error,
    },

    /// IO error during a source operation
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Custom error.
    #[error(transparent)]
    Custom(#[from] AnyError),
}

/// A failure reported by one registered source while the overlay scanned the priority list.
#[derive(Debug)]
pub struct SourceFailure {
    /// The position of the source in the priority list at the time of the scan
    pub index: usize,

    /// The error the source returned
    pub error: MultiFsError,
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MultiFsError {
    /// Creates a `Custom` error from any error.
    pub fn custom(error: impl Into<anyhow::Error>) -> MultiFsError {
        MultiFsError::Custom(AnyError {
            error: error.into(),
        })
    }

    /// Creates a `NotFound` error with no recorded causes.
    pub fn not_found(path: impl Into<VirtualPath>) -> MultiFsError {
        MultiFsError::NotFound {
            path: path.into(),
            causes: Vec::new(),
        }
    }

    /// Creates an `Unsupported` error for the named operation.
    pub fn unsupported(operation: &'static str) -> MultiFsError {
        MultiFsError::Unsupported { operation }
    }

    /// Returns `true` if the error means the path is simply absent.
    ///
    /// IO errors of kind `NotFound` count as absent too, since sources backed by a host
    /// filesystem surface missing paths that way.
    pub fn is_not_found(&self) -> bool {
        match self {
            MultiFsError::NotFound { .. } => true,
            MultiFsError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Returns the per-source failures attached to a `NotFound` error.
    pub fn causes(&self) -> &[SourceFailure] {
        match self {
            MultiFsError::NotFound { causes, .. } => causes,
            _ => &[],
        }
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `MultiFsResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> MultiFsResult<T> {
    Result::Ok(value)
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}

impl Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source #{}: {}", self.index, self.error)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
