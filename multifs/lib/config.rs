//! Declarative overlay setup from TOML.
//!
//! ```toml
//! [[sources]]
//! path = "overrides"
//! priority = 0
//!
//! [[sources]]
//! path = "/usr/share/app/defaults"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use getset::Getters;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{MultiFs, MultiFsError, MultiFsResult, NativeFs, LAST_PRIORITY};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The sources of an overlay, registered in the order they are listed.
#[derive(Debug, Default, Clone, Serialize, Deserialize, TypedBuilder, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct MultiFsConfig {
    /// The on-disk directories to register.
    #[serde(default)]
    #[builder(default)]
    sources: Vec<SourceConfig>,
}

/// One on-disk directory and where it goes in the priority list.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct SourceConfig {
    /// The root directory of the source.
    #[builder(setter(into))]
    path: PathBuf,

    /// `0` registers ahead of the sources already registered, a negative value behind them and
    /// any other value at that position.
    #[serde(default = "default_priority")]
    #[builder(default = LAST_PRIORITY)]
    priority: i64,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MultiFsConfig {
    /// Parses a configuration from TOML text.
    ///
    /// ## Errors
    ///
    /// Returns `Config` if the text is not a valid configuration.
    pub fn from_toml_str(text: &str) -> MultiFsResult<Self> {
        toml::from_str(text).map_err(|e| MultiFsError::Config(e.to_string()))
    }

    /// Reads a configuration file.
    ///
    /// Relative source paths are resolved against the directory holding the file.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (`Io`)
    /// - The file is not a valid configuration (`ConfigParse`)
    pub fn load(path: impl AsRef<Path>) -> MultiFsResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&text).map_err(|source| MultiFsError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            for source in &mut config.sources {
                if source.path.is_relative() && !source.path.as_os_str().is_empty() {
                    source.path = base.join(&source.path);
                }
            }
        }

        tracing::debug!(path = %path.display(), sources = config.sources.len(), "loaded config");
        Ok(config)
    }

    /// Builds an overlay with one [`NativeFs`] per source.
    ///
    /// ## Errors
    ///
    /// Returns `Config` if a source has an empty path.
    pub fn build(&self) -> MultiFsResult<MultiFs> {
        let mut multifs = MultiFs::new();
        for (index, source) in self.sources.iter().enumerate() {
            if source.path.as_os_str().is_empty() {
                return Err(MultiFsError::Config(format!(
                    "source {index} has an empty path"
                )));
            }

            multifs.insert(Arc::new(NativeFs::new(&source.path)), source.priority);
        }

        Ok(multifs)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn default_priority() -> i64 {
    LAST_PRIORITY
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
