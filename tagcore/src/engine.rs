//! The external tagger engine.
//!
//! tagcore does not analyze text itself. A [`TaggerEngine`] wraps the native
//! tagger: it opens a staged dictionary into an opaque handle, parses
//! queries with that handle and finally closes it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::EngineError;
use crate::manifest::DEFAULT_RUNTIME_CONFIG_FILE;

/// Type alias for engine operation results.
pub type EngineResult<T> = Result<T, EngineError>;

/// Opaque native tagger reached through three operations.
///
/// Implementations may assume `parse` and `close` only ever receive handles
/// their own `open` returned, and that nothing is called with a handle after
/// `close` for it has settled.
#[async_trait]
pub trait TaggerEngine: Send + Sync {
    /// Opaque handle to an open tagger.
    type Handle: Clone + Send + Sync + std::fmt::Debug + 'static;

    /// Opens the dictionary staged at `args.dicdir`, configured by the
    /// runtime configuration file at `args.rcfile`.
    async fn open(&self, args: &EngineArgs) -> EngineResult<Self::Handle>;

    /// Tags `query`, returning the engine's raw text output.
    ///
    /// Each output line has the form `surface: feature,feature,...`.
    async fn parse(&self, handle: &Self::Handle, query: &str) -> EngineResult<String>;

    /// Releases the tagger behind `handle`.
    async fn close(&self, handle: Self::Handle) -> EngineResult<()>;
}

/// Command-line style arguments a MeCab-compatible engine is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineArgs {
    /// Directory holding the dictionary files
    pub dicdir: PathBuf,
    /// Runtime configuration file
    pub rcfile: PathBuf,
}

impl EngineArgs {
    /// Arguments for a dictionary staged at `dictionary_dir` with the default
    /// runtime configuration file beside it.
    pub fn for_directory(dictionary_dir: &Path) -> Self {
        Self::with_rcfile(dictionary_dir, DEFAULT_RUNTIME_CONFIG_FILE)
    }

    /// Arguments for a dictionary staged at `dictionary_dir` with a custom
    /// runtime configuration file name.
    ///
    /// [`StagerConfig::engine_args`](crate::config::StagerConfig::engine_args)
    /// builds these from the configured file name.
    pub fn with_rcfile(dictionary_dir: &Path, rcfile: &str) -> Self {
        Self {
            dicdir: dictionary_dir.to_path_buf(),
            rcfile: dictionary_dir.join(rcfile),
        }
    }

    /// Renders the arguments as a single parameter string.
    pub fn to_param_string(&self) -> String {
        format!(
            "--dicdir {} --rcfile {}",
            self.dicdir.display(),
            self.rcfile.display()
        )
    }
}
