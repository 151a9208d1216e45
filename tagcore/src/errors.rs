//! Error types for tagcore.
//!
//! Every failure the lifecycle controller can report is a [`TagcoreError`].
//! The type is `Clone` because a single initialization failure is broadcast
//! to every caller waiting on the ready barrier, so collaborator errors are
//! captured as owned messages rather than boxed sources.
//!
//! # Error Categories
//!
//! - **State errors**: `InvalidTransition`, `NotInitialized`, `Disposed`,
//!   `FailedState` and `Interrupted` report misuse of the lifecycle
//! - **Staging errors**: `NotFound`, `IncompleteManifest` and
//!   `InvalidDictionaryId` report a bad dictionary bundle
//! - **Collaborator errors**: `Filesystem` and `Engine` carry the
//!   collaborator's own message verbatim
//! - **Construction errors**: `Configuration` reports a tagger that could not
//!   be assembled

use std::fmt;
use std::io;
use std::path::Path;

use thiserror::Error;

/// Why a call to `initialize` was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitializeRejection {
    /// Another `initialize` call is still in flight.
    Initializing,
    /// The tagger already holds an open handle.
    Initialized,
    /// The tagger has been disposed of.
    Disposed,
    /// A previous initialization failed.
    Failed,
}

impl fmt::Display for InitializeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Initializing => "is currently initializing",
            Self::Initialized => "has already been initialized",
            Self::Disposed => "has been disposed of",
            Self::Failed => "is in a failed state",
        };
        f.write_str(reason)
    }
}

/// Errors reported by a [`Tagger`](crate::tagger::Tagger) and its stager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagcoreError {
    /// `initialize` was called outside of the `Uninitialized` state.
    #[error("Cannot call `initialize(...)`, the tagger {0}.")]
    InvalidTransition(InitializeRejection),

    /// `tokenize` or `dispose` was called before `initialize`.
    #[error("The tagger was not initialized. Did you forget to call `initialize(...)`?")]
    NotInitialized,

    /// `tokenize` or `dispose` was called after `dispose`.
    #[error("This instance has been disposed of.")]
    Disposed,

    /// `tokenize` or `dispose` was called after a failed initialization.
    #[error("This instance is in a failed state.")]
    FailedState,

    /// The dictionary root does not exist in the bundle.
    #[error("Path \"{0}\" was not found in the dictionary bundle.")]
    NotFound(String),

    /// One or more manifest files are absent from the bundle.
    #[error(
        "Invalid contents of the dictionary directory. The following files are missing: {}.",
        quote_join(.missing)
    )]
    IncompleteManifest {
        /// Missing file names in manifest order
        missing: Vec<String>,
    },

    /// The dictionary identifier is empty once separators are stripped.
    #[error("Invalid dictionary identifier \"{0}\"")]
    InvalidDictionaryId(String),

    /// The tagger could not be assembled.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The writable filesystem or the bundle failed.
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// The external tagger engine failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Initialization was abandoned before it could settle.
    #[error("Initialization was interrupted before it completed.")]
    Interrupted,
}

/// Type alias for results of tagcore operations.
pub type TagcoreResult<T> = Result<T, TagcoreError>;

fn quote_join(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The filesystem or bundle operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOperation {
    /// Existence check
    Exists,
    /// Directory creation
    CreateDir,
    /// File write
    Write,
    /// File removal
    Remove,
    /// File copy
    Copy,
}

impl fmt::Display for FsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exists => "exists",
            Self::CreateDir => "mkdir",
            Self::Write => "write",
            Self::Remove => "remove",
            Self::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// A failure reported by a [`Filesystem`](crate::filesystem::Filesystem) or
/// [`BundleStore`](crate::bundle::BundleStore).
///
/// The message is whatever the underlying collaborator reported; tagcore
/// never rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FilesystemError {
    /// Operation that failed
    pub operation: FsOperation,
    /// Path the operation was applied to
    pub path: String,
    /// Kind of the underlying I/O error
    pub kind: io::ErrorKind,
    /// Message reported by the collaborator
    pub message: String,
}

impl FilesystemError {
    /// Creates an error from its parts.
    pub fn new(
        operation: FsOperation,
        path: impl AsRef<Path>,
        kind: io::ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            path: path.as_ref().display().to_string(),
            kind,
            message: message.into(),
        }
    }

    /// Captures an `io::Error` raised while performing `operation` on `path`.
    pub fn from_io(operation: FsOperation, path: impl AsRef<Path>, error: &io::Error) -> Self {
        Self::new(operation, path, error.kind(), error.to_string())
    }
}

/// A failure reported by a [`TaggerEngine`](crate::engine::TaggerEngine).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(String);

impl EngineError {
    /// Creates an engine error carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The engine's message.
    pub fn message(&self) -> &str {
        &self.0
    }
}
