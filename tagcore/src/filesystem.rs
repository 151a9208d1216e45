//! Writable filesystem abstraction.
//!
//! The stager never touches the disk directly; it goes through a
//! [`Filesystem`] so staging can run against the real disk
//! ([`LocalFilesystem`]) or an in-memory double in tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{FilesystemError, FsOperation};

/// Type alias for filesystem operation results.
pub type FsResult<T> = Result<T, FilesystemError>;

/// Asynchronous operations on the writable area dictionaries are staged into.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Creates `path` and any missing parents. Succeeds if it already exists.
    async fn create_dir(&self, path: &Path) -> FsResult<()>;

    /// Whether anything exists at `path`.
    async fn exists(&self, path: &Path) -> FsResult<bool>;

    /// Writes `contents` to `path`, replacing any existing file.
    async fn write_file(&self, path: &Path, contents: &[u8]) -> FsResult<()>;

    /// Removes the file at `path`.
    async fn remove_file(&self, path: &Path) -> FsResult<()>;

    /// Copies the file at `source` to `destination`.
    async fn copy_file(&self, source: &Path, destination: &Path) -> FsResult<()>;
}

#[async_trait]
impl<T> Filesystem for Arc<T>
where
    T: Filesystem + ?Sized,
{
    async fn create_dir(&self, path: &Path) -> FsResult<()> {
        (**self).create_dir(path).await
    }

    async fn exists(&self, path: &Path) -> FsResult<bool> {
        (**self).exists(path).await
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> FsResult<()> {
        (**self).write_file(path, contents).await
    }

    async fn remove_file(&self, path: &Path) -> FsResult<()> {
        (**self).remove_file(path).await
    }

    async fn copy_file(&self, source: &Path, destination: &Path) -> FsResult<()> {
        (**self).copy_file(source, destination).await
    }
}

/// [`Filesystem`] backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Creates a local filesystem handle.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn create_dir(&self, path: &Path) -> FsResult<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| FilesystemError::from_io(FsOperation::CreateDir, path, &e))
    }

    async fn exists(&self, path: &Path) -> FsResult<bool> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|e| FilesystemError::from_io(FsOperation::Exists, path, &e))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> FsResult<()> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| FilesystemError::from_io(FsOperation::Write, path, &e))
    }

    async fn remove_file(&self, path: &Path) -> FsResult<()> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| FilesystemError::from_io(FsOperation::Remove, path, &e))
    }

    async fn copy_file(&self, source: &Path, destination: &Path) -> FsResult<()> {
        tokio::fs::copy(source, destination)
            .await
            .map(|_| ())
            .map_err(|e| FilesystemError::from_io(FsOperation::Copy, source, &e))
    }
}
