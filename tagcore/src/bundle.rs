//! Read-only dictionary bundles.
//!
//! A bundle is where dictionaries ship with the application. Paths inside a
//! bundle are relative and `/`-separated, e.g. `ipadic/sys.dic`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::filesystem::{Filesystem, FsResult};

/// Source of bundled dictionary files.
#[async_trait]
pub trait BundleStore: Send + Sync {
    /// Whether the bundle contains a file or directory at `path`.
    async fn exists(&self, path: &str) -> FsResult<bool>;

    /// Copies the bundled file at `source` to `destination` on the writable
    /// filesystem.
    async fn copy_to(&self, source: &str, destination: &Path) -> FsResult<()>;
}

#[async_trait]
impl<T> BundleStore for Arc<T>
where
    T: BundleStore + ?Sized,
{
    async fn exists(&self, path: &str) -> FsResult<bool> {
        (**self).exists(path).await
    }

    async fn copy_to(&self, source: &str, destination: &Path) -> FsResult<()> {
        (**self).copy_to(source, destination).await
    }
}

/// A bundle laid out as a plain directory tree under `root`.
///
/// Existence checks and copies go through the given [`Filesystem`] using
/// ordinary file copies. An existing destination file is removed before the
/// copy, so restaging over a previous run replaces every file.
#[derive(Debug, Clone)]
pub struct DirectoryBundle<F> {
    filesystem: F,
    root: PathBuf,
}

impl<F> DirectoryBundle<F>
where
    F: Filesystem,
{
    /// Creates a bundle rooted at `root`.
    pub fn new(filesystem: F, root: impl Into<PathBuf>) -> Self {
        Self {
            filesystem,
            root: root.into(),
        }
    }

    /// Directory the bundle is read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |resolved, segment| resolved.join(segment))
    }
}

#[async_trait]
impl<F> BundleStore for DirectoryBundle<F>
where
    F: Filesystem,
{
    async fn exists(&self, path: &str) -> FsResult<bool> {
        self.filesystem.exists(&self.resolve(path)).await
    }

    async fn copy_to(&self, source: &str, destination: &Path) -> FsResult<()> {
        if self.filesystem.exists(destination).await? {
            debug!(destination = %destination.display(), "Removing previously staged file");
            self.filesystem.remove_file(destination).await?;
        }

        self.filesystem
            .copy_file(&self.resolve(source), destination)
            .await
    }
}
