//! Dictionary staging.
//!
//! The [`DictionaryStager`] copies a bundled dictionary into the writable
//! documents directory so the native engine can open it from a real path:
//!
//! 1. the dictionary root must exist in the bundle, else `NotFound`
//! 2. the staged directory is created
//! 3. every manifest file present in the bundle is copied; absent files are
//!    collected and reported together as `IncompleteManifest`
//! 4. an empty runtime configuration file is written unless one exists
//!
//! Nothing is rolled back on failure, so a failed stage can leave a partially
//! populated directory behind.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::bundle::BundleStore;
use crate::config::{CopyFailurePolicy, StagerConfig};
use crate::errors::{TagcoreError, TagcoreResult};
use crate::filesystem::Filesystem;
use crate::manifest::{bundle_path, DICTIONARY_FILES};
use crate::types::DictionaryId;

/// Copies bundled dictionaries into the writable documents directory.
#[derive(Debug, Clone)]
pub struct DictionaryStager<B, F> {
    bundle: B,
    filesystem: F,
    config: StagerConfig,
}

impl<B, F> DictionaryStager<B, F>
where
    B: BundleStore,
    F: Filesystem,
{
    /// Creates a stager reading from `bundle` and writing through
    /// `filesystem`.
    pub const fn new(bundle: B, filesystem: F, config: StagerConfig) -> Self {
        Self {
            bundle,
            filesystem,
            config,
        }
    }

    /// The stager's configuration.
    pub const fn config(&self) -> &StagerConfig {
        &self.config
    }

    /// Stages `dictionary` and returns the prepared directory.
    #[instrument(skip_all, fields(dictionary = %dictionary))]
    pub async fn stage(&self, dictionary: &DictionaryId) -> TagcoreResult<PathBuf> {
        let source_root = dictionary.as_ref();

        if !self.bundle.exists(source_root).await? {
            return Err(TagcoreError::NotFound(source_root.to_string()));
        }

        let staged_dir = self.config.staged_dir(dictionary);
        self.filesystem.create_dir(&staged_dir).await?;
        debug!(staged_dir = %staged_dir.display(), "Created staging directory");

        let mut missing = Vec::new();
        for file_name in DICTIONARY_FILES {
            let source = bundle_path(source_root, file_name);

            if !self.bundle.exists(&source).await? {
                debug!(file = file_name, "Dictionary file missing from bundle");
                missing.push(file_name.to_string());
                continue;
            }

            self.copy_file(&source, &staged_dir.join(file_name)).await?;
        }

        if !missing.is_empty() {
            return Err(TagcoreError::IncompleteManifest { missing });
        }

        self.ensure_runtime_config(&staged_dir).await?;

        info!(staged_dir = %staged_dir.display(), "Dictionary staged");
        Ok(staged_dir)
    }

    async fn copy_file(&self, source: &str, destination: &Path) -> TagcoreResult<()> {
        match self.bundle.copy_to(source, destination).await {
            Ok(()) => {
                debug!(source, "Copied dictionary file");
                Ok(())
            }
            Err(error) if self.config.copy_failures == CopyFailurePolicy::Warn => {
                warn!(
                    source,
                    destination = %destination.display(),
                    %error,
                    "Failed to copy dictionary file, continuing"
                );
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn ensure_runtime_config(&self, staged_dir: &Path) -> TagcoreResult<()> {
        let path = self.config.runtime_config_path(staged_dir);

        if self.filesystem.exists(&path).await? {
            debug!(path = %path.display(), "Keeping existing runtime config");
            return Ok(());
        }

        self.filesystem.write_file(&path, b"").await?;
        debug!(path = %path.display(), "Wrote empty runtime config");
        Ok(())
    }
}
