//! `multifs` merges several filesystem sources into a single prioritized, read-only view.
//!
//! Sources are kept in a priority list. Lookups such as [`MultiFs::open`] return the answer of
//! the first source that has the path, while [`MultiFs::glob`] and [`MultiFs::walk`] combine every
//! source into one deduplicated result.
//!
//! ```
//! use std::sync::Arc;
//! use multifs::{MemoryFs, MultiFs, Priority};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let defaults = Arc::new(MemoryFs::new().with_file("config/app.toml", "level = 1")?);
//! let overrides = Arc::new(MemoryFs::new().with_file("config/app.toml", "level = 2")?);
//!
//! let mut fs = MultiFs::new();
//! fs.insert(defaults, Priority::Last);
//! fs.insert(overrides, Priority::First);
//!
//! assert_eq!(fs.read_file("/config/../config/app.toml")?, b"level = 2");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_inception)]

mod backend;
mod config;
mod defaults;
mod error;
mod glob;
mod implementations;
mod metadata;
mod multifs;
mod path;
mod segment;
mod walk;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use backend::*;
pub use config::*;
pub use defaults::*;
pub use error::*;
pub use glob::*;
pub use implementations::*;
pub use metadata::*;
pub use multifs::*;
pub use path::*;
pub use segment::*;
pub use walk::*;
