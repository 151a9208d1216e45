//! Staging configuration.
//!
//! A [`StagerConfig`] says where dictionaries are staged, what the runtime
//! configuration file is called, and how copy failures are treated. The two
//! presets mirror the two bundle layouts tagcore supports:
//!
//! - [`StagerConfig::asset_bundle`]: dictionaries live in a packaged asset
//!   catalog; every copy failure is fatal.
//! - [`StagerConfig::directory_bundle`]: dictionaries live in a plain
//!   read-only directory; copy failures are logged and tolerated, so two
//!   instances staging the same dictionary cannot fail each other.

use std::path::{Path, PathBuf};

use nutype::nutype;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineArgs;
use crate::manifest::DEFAULT_RUNTIME_CONFIG_FILE;
use crate::types::DictionaryId;

/// Errors raised while loading a [`StagerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("Invalid stager configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// File name of the runtime configuration file handed to the engine.
///
/// Must be a bare, non-empty file name.
#[nutype(
    sanitize(trim),
    validate(not_empty, predicate = |name: &str| !name.contains(['/', '\\'])),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct RuntimeConfigFile(String);

impl Default for RuntimeConfigFile {
    fn default() -> Self {
        Self::try_new(DEFAULT_RUNTIME_CONFIG_FILE)
            .expect("the default runtime config file name is always valid")
    }
}

/// How a failed per-file copy affects staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyFailurePolicy {
    /// The copy error aborts staging.
    #[default]
    Fatal,
    /// The copy error is logged as a warning and staging continues.
    Warn,
}

/// Configuration for a [`DictionaryStager`](crate::stager::DictionaryStager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagerConfig {
    /// Writable directory dictionaries are staged into
    pub documents_dir: PathBuf,
    /// Runtime configuration file synthesized in the staged directory
    #[serde(default)]
    pub runtime_config_file: RuntimeConfigFile,
    /// Treatment of per-file copy failures
    #[serde(default)]
    pub copy_failures: CopyFailurePolicy,
}

impl StagerConfig {
    /// Configuration for dictionaries shipped in a packaged asset catalog.
    pub fn asset_bundle(documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
            runtime_config_file: RuntimeConfigFile::default(),
            copy_failures: CopyFailurePolicy::Fatal,
        }
    }

    /// Configuration for dictionaries shipped as a plain directory tree.
    pub fn directory_bundle(documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            copy_failures: CopyFailurePolicy::Warn,
            ..Self::asset_bundle(documents_dir)
        }
    }

    /// Overrides the runtime configuration file name.
    #[must_use]
    pub fn with_runtime_config_file(mut self, file: RuntimeConfigFile) -> Self {
        self.runtime_config_file = file;
        self
    }

    /// Parses a configuration from JSON.
    ///
    /// ```rust
    /// use tagcore::config::{CopyFailurePolicy, StagerConfig};
    ///
    /// let config = StagerConfig::from_json(
    ///     r#"{ "documents_dir": "/data/documents", "copy_failures": "warn" }"#,
    /// ).unwrap();
    /// assert_eq!(config.copy_failures, CopyFailurePolicy::Warn);
    /// assert_eq!(config.runtime_config_file.as_ref(), "mecabrc");
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Directory a dictionary with the given identifier is staged into.
    ///
    /// Taking a normalized [`DictionaryId`] keeps a leading separator from
    /// replacing the documents directory in the join.
    pub fn staged_dir(&self, dictionary: &DictionaryId) -> PathBuf {
        self.documents_dir.join(dictionary.as_ref())
    }

    /// Path of the runtime configuration file inside `staged_dir`.
    pub fn runtime_config_path(&self, staged_dir: &Path) -> PathBuf {
        staged_dir.join(self.runtime_config_file.as_ref())
    }

    /// Arguments the engine opens the dictionary staged at `staged_dir`
    /// with, pointing `--rcfile` at the configured runtime config file.
    pub fn engine_args(&self, staged_dir: &Path) -> EngineArgs {
        EngineArgs::with_rcfile(staged_dir, self.runtime_config_file.as_ref())
    }
}
