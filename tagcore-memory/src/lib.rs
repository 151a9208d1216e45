//! In-memory adapters for the `tagcore` collaborator traits
//!
//! This crate provides an in-memory [`Filesystem`], [`BundleStore`] and
//! [`TaggerEngine`], useful for testing and development scenarios where no
//! real dictionary or native tagger is available. Every adapter records the
//! calls it receives and can be told to fail specific operations.
//!
//! All adapters are cheap to clone; clones share state, so a test can hand
//! one clone to a `Tagger` and inspect another.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tagcore::bundle::BundleStore;
use tagcore::engine::{EngineArgs, EngineResult, TaggerEngine};
use tagcore::errors::{EngineError, FilesystemError, FsOperation};
use tagcore::filesystem::{Filesystem, FsResult};
use tagcore::manifest::{bundle_path, DICTIONARY_FILES};
use tokio::sync::Notify;
use uuid::Uuid;

/// A call received by an [`InMemoryFilesystem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCall {
    /// `create_dir(path)`
    CreateDir(PathBuf),
    /// `exists(path)`
    Exists(PathBuf),
    /// `write_file(path, contents)`
    WriteFile(PathBuf, Vec<u8>),
    /// `remove_file(path)`
    RemoveFile(PathBuf),
    /// `copy_file(source, destination)`
    CopyFile(PathBuf, PathBuf),
}

#[derive(Default)]
struct FsState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    calls: Vec<FsCall>,
    failures: HashMap<(FsOperation, PathBuf), String>,
}

impl FsState {
    fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
            || self.dirs.contains(path)
            || self.files.keys().any(|file| file.starts_with(path))
    }

    fn injected(&self, operation: FsOperation, path: &Path) -> FsResult<()> {
        match self.failures.get(&(operation, path.to_path_buf())) {
            Some(message) => Err(FilesystemError::new(
                operation,
                path,
                io::ErrorKind::Other,
                message.clone(),
            )),
            None => Ok(()),
        }
    }
}

/// Thread-safe in-memory writable filesystem for testing.
#[derive(Clone, Default)]
pub struct InMemoryFilesystem {
    state: Arc<Mutex<FsState>>,
}

impl InMemoryFilesystem {
    /// Creates an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file without recording a call.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert_file(path, contents);
        self
    }

    /// Adds or replaces a file without recording a call.
    pub fn insert_file(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.state.lock().files.insert(path.into(), contents.into());
    }

    /// Contents of the file at `path`, if any.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state.lock().files.get(path.as_ref()).cloned()
    }

    /// Whether a directory was created at `path`.
    pub fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        self.state.lock().dirs.contains(path.as_ref())
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<FsCall> {
        self.state.lock().calls.clone()
    }

    /// Paths passed to `write_file`, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                FsCall::WriteFile(path, _) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Makes `operation` on `path` fail with `message`.
    ///
    /// Copies are matched on their destination.
    pub fn fail_on(&self, operation: FsOperation, path: impl Into<PathBuf>, message: &str) {
        self.state
            .lock()
            .failures
            .insert((operation, path.into()), message.to_string());
    }

    fn record(&self, call: FsCall) -> parking_lot::MutexGuard<'_, FsState> {
        let mut state = self.state.lock();
        state.calls.push(call);
        state
    }
}

impl fmt::Debug for InMemoryFilesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InMemoryFilesystem")
            .field("files", &state.files.keys().collect::<Vec<_>>())
            .field("dirs", &state.dirs)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Filesystem for InMemoryFilesystem {
    async fn create_dir(&self, path: &Path) -> FsResult<()> {
        let mut state = self.record(FsCall::CreateDir(path.to_path_buf()));
        state.injected(FsOperation::CreateDir, path)?;
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    async fn exists(&self, path: &Path) -> FsResult<bool> {
        let state = self.record(FsCall::Exists(path.to_path_buf()));
        state.injected(FsOperation::Exists, path)?;
        Ok(state.contains(path))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> FsResult<()> {
        let mut state = self.record(FsCall::WriteFile(path.to_path_buf(), contents.to_vec()));
        state.injected(FsOperation::Write, path)?;
        state.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> FsResult<()> {
        let mut state = self.record(FsCall::RemoveFile(path.to_path_buf()));
        state.injected(FsOperation::Remove, path)?;
        state.files.remove(path).map(|_| ()).ok_or_else(|| {
            FilesystemError::new(
                FsOperation::Remove,
                path,
                io::ErrorKind::NotFound,
                format!("No such file: {}", path.display()),
            )
        })
    }

    async fn copy_file(&self, source: &Path, destination: &Path) -> FsResult<()> {
        let mut state = self.record(FsCall::CopyFile(
            source.to_path_buf(),
            destination.to_path_buf(),
        ));
        state.injected(FsOperation::Copy, destination)?;
        let contents = state.files.get(source).cloned().ok_or_else(|| {
            FilesystemError::new(
                FsOperation::Copy,
                source,
                io::ErrorKind::NotFound,
                format!("No such file: {}", source.display()),
            )
        })?;
        state.files.insert(destination.to_path_buf(), contents);
        Ok(())
    }
}

/// A call received by an [`InMemoryBundle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleCall {
    /// `exists(path)`
    Exists(String),
    /// `copy_to(source, destination)`
    CopyTo(String, PathBuf),
}

#[derive(Default)]
struct BundleState {
    entries: BTreeMap<String, Vec<u8>>,
    calls: Vec<BundleCall>,
    copy_failures: HashMap<String, String>,
}

/// Thread-safe in-memory asset bundle for testing.
///
/// Copies land in the [`InMemoryFilesystem`] the bundle was created with.
#[derive(Clone)]
pub struct InMemoryBundle {
    target: InMemoryFilesystem,
    state: Arc<Mutex<BundleState>>,
}

impl InMemoryBundle {
    /// Creates an empty bundle copying into `target`.
    pub fn new(target: InMemoryFilesystem) -> Self {
        Self {
            target,
            state: Arc::default(),
        }
    }

    /// Creates a bundle holding every manifest file under `dictionary`.
    pub fn with_dictionary(target: InMemoryFilesystem, dictionary: &str) -> Self {
        let bundle = Self::new(target);
        for file_name in DICTIONARY_FILES {
            bundle.insert(
                &bundle_path(dictionary, file_name),
                format!("{dictionary}:{file_name}"),
            );
        }
        bundle
    }

    /// Adds or replaces a bundled file.
    pub fn insert(&self, path: &str, contents: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .entries
            .insert(path.to_string(), contents.into());
    }

    /// Removes a bundled file.
    pub fn remove(&self, path: &str) {
        self.state.lock().entries.remove(path);
    }

    /// Makes copies of `source` fail with `message`.
    pub fn fail_copy(&self, source: &str, message: &str) {
        self.state
            .lock()
            .copy_failures
            .insert(source.to_string(), message.to_string());
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<BundleCall> {
        self.state.lock().calls.clone()
    }

    /// `(source, destination)` pairs of every copy attempted, in order.
    pub fn copies(&self) -> Vec<(String, PathBuf)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BundleCall::CopyTo(source, destination) => {
                    Some((source.clone(), destination.clone()))
                }
                BundleCall::Exists(_) => None,
            })
            .collect()
    }
}

impl fmt::Debug for InMemoryBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InMemoryBundle")
            .field("entries", &state.entries.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BundleStore for InMemoryBundle {
    async fn exists(&self, path: &str) -> FsResult<bool> {
        let mut state = self.state.lock();
        state.calls.push(BundleCall::Exists(path.to_string()));
        let prefix = format!("{path}/");
        Ok(state
            .entries
            .keys()
            .any(|entry| entry == path || entry.starts_with(&prefix)))
    }

    async fn copy_to(&self, source: &str, destination: &Path) -> FsResult<()> {
        let contents = {
            let mut state = self.state.lock();
            state
                .calls
                .push(BundleCall::CopyTo(source.to_string(), destination.to_path_buf()));

            if let Some(message) = state.copy_failures.get(source) {
                return Err(FilesystemError::new(
                    FsOperation::Copy,
                    source,
                    io::ErrorKind::Other,
                    message.clone(),
                ));
            }

            state.entries.get(source).cloned().ok_or_else(|| {
                FilesystemError::new(
                    FsOperation::Copy,
                    source,
                    io::ErrorKind::NotFound,
                    format!("Asset \"{source}\" does not exist"),
                )
            })?
        };

        self.target.insert_file(destination, contents);
        Ok(())
    }
}

/// Handle issued by [`InMemoryEngine::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaggerKey(Uuid);

impl fmt::Display for TaggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A call received by an [`InMemoryEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `open(args)`
    Open(EngineArgs),
    /// `parse(handle, query)`
    Parse(TaggerKey, String),
    /// `close(handle)`
    Close(TaggerKey),
}

#[derive(Default)]
struct EngineState {
    open: HashMap<TaggerKey, PathBuf>,
    calls: Vec<EngineCall>,
    responses: HashMap<String, String>,
    open_failure: Option<String>,
    parse_failure: Option<String>,
}

/// Releases an [`InMemoryEngine`] held by [`InMemoryEngine::hold_open`] or
/// [`InMemoryEngine::hold_parse`].
#[derive(Debug, Clone)]
pub struct EngineGate {
    notify: Arc<Notify>,
}

impl EngineGate {
    fn new() -> (Arc<Notify>, Self) {
        let notify = Arc::new(Notify::new());
        (Arc::clone(&notify), Self { notify })
    }

    /// Lets one pending (or the next) held call proceed.
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

/// Thread-safe in-memory tagger engine for testing.
///
/// Handles are random keys tracked in a registry, so `parse` and `close`
/// fail for keys the engine never issued or has already closed.
#[derive(Clone, Default)]
pub struct InMemoryEngine {
    state: Arc<Mutex<EngineState>>,
    open_gate: Option<Arc<Notify>>,
    parse_gate: Option<Arc<Notify>>,
}

impl InMemoryEngine {
    /// Creates an engine that opens immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine whose `open` calls block until the returned gate
    /// is released.
    pub fn hold_open() -> (Self, EngineGate) {
        let (notify, gate) = EngineGate::new();
        let engine = Self {
            open_gate: Some(notify),
            ..Self::default()
        };
        (engine, gate)
    }

    /// Creates an engine whose `parse` calls block until the returned gate
    /// is released. The handle is checked after the gate opens.
    pub fn hold_parse() -> (Self, EngineGate) {
        let (notify, gate) = EngineGate::new();
        let engine = Self {
            parse_gate: Some(notify),
            ..Self::default()
        };
        (engine, gate)
    }

    /// Output `parse` returns for `query`. Unknown queries produce empty
    /// output.
    pub fn respond_with(&self, query: &str, output: &str) {
        self.state
            .lock()
            .responses
            .insert(query.to_string(), output.to_string());
    }

    /// Makes every `open` call fail with `message`.
    pub fn fail_open(&self, message: &str) {
        self.state.lock().open_failure = Some(message.to_string());
    }

    /// Makes every `parse` call fail with `message`.
    pub fn fail_parse(&self, message: &str) {
        self.state.lock().parse_failure = Some(message.to_string());
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    /// Number of handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.state.lock().open.len()
    }

    fn unknown_key(key: TaggerKey) -> EngineError {
        EngineError::new(format!("Pointer with key \"{key}\" doesn't exist."))
    }
}

impl fmt::Debug for InMemoryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryEngine")
            .field("open_handles", &self.open_handles())
            .field("open_gated", &self.open_gate.is_some())
            .field("parse_gated", &self.parse_gate.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TaggerEngine for InMemoryEngine {
    type Handle = TaggerKey;

    async fn open(&self, args: &EngineArgs) -> EngineResult<TaggerKey> {
        self.state.lock().calls.push(EngineCall::Open(args.clone()));

        if let Some(gate) = &self.open_gate {
            gate.notified().await;
        }

        let mut state = self.state.lock();
        if let Some(message) = &state.open_failure {
            return Err(EngineError::new(message.clone()));
        }

        let key = TaggerKey(Uuid::now_v7());
        state.open.insert(key, args.dicdir.clone());
        Ok(key)
    }

    async fn parse(&self, handle: &TaggerKey, query: &str) -> EngineResult<String> {
        self.state
            .lock()
            .calls
            .push(EngineCall::Parse(*handle, query.to_string()));

        if let Some(gate) = &self.parse_gate {
            gate.notified().await;
        }

        let state = self.state.lock();
        if !state.open.contains_key(handle) {
            return Err(Self::unknown_key(*handle));
        }
        if let Some(message) = &state.parse_failure {
            return Err(EngineError::new(message.clone()));
        }

        Ok(state.responses.get(query).cloned().unwrap_or_default())
    }

    async fn close(&self, handle: TaggerKey) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Close(handle));
        state
            .open
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| Self::unknown_key(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bundle_copies_land_in_the_target_filesystem() {
        let filesystem = InMemoryFilesystem::new();
        let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");

        assert!(bundle.exists("ipadic").await.unwrap());
        assert!(bundle.exists("ipadic/sys.dic").await.unwrap());
        assert!(!bundle.exists("ipa").await.unwrap());

        bundle
            .copy_to("ipadic/sys.dic", Path::new("/documents/ipadic/sys.dic"))
            .await
            .unwrap();

        assert_eq!(
            filesystem.read_file("/documents/ipadic/sys.dic"),
            Some(b"ipadic:sys.dic".to_vec())
        );
        assert!(filesystem.calls().is_empty());
    }

    #[tokio::test]
    async fn filesystem_injected_failures_are_reported() {
        let filesystem = InMemoryFilesystem::new();
        filesystem.fail_on(FsOperation::CreateDir, "/documents/ipadic", "disk full");

        let error = filesystem
            .create_dir(Path::new("/documents/ipadic"))
            .await
            .unwrap_err();

        assert_eq!(error.message, "disk full");
        assert!(!filesystem.has_dir("/documents/ipadic"));
    }

    #[tokio::test]
    async fn engine_rejects_unknown_and_closed_handles() {
        let engine = InMemoryEngine::new();
        let key = engine
            .open(&EngineArgs::for_directory(Path::new("/documents/ipadic")))
            .await
            .unwrap();
        engine.respond_with("猫", "猫: 名詞,一般,*,*,*,*,猫,ネコ,ネコ\n");

        assert_eq!(
            engine.parse(&key, "猫").await.unwrap(),
            "猫: 名詞,一般,*,*,*,*,猫,ネコ,ネコ\n"
        );

        engine.close(key).await.unwrap();
        assert_eq!(engine.open_handles(), 0);

        let error = engine.parse(&key, "猫").await.unwrap_err();
        assert!(error.message().contains("doesn't exist"));
        assert!(engine.close(key).await.is_err());
    }

    #[tokio::test]
    async fn gated_engine_waits_for_release() {
        let (engine, gate) = InMemoryEngine::hold_open();
        let args = EngineArgs::for_directory(Path::new("/documents/ipadic"));
        let mut open = tokio_test::task::spawn(engine.open(&args));

        tokio_test::assert_pending!(open.poll());
        gate.release();
        tokio_test::assert_ready_ok!(open.poll());
    }

    #[tokio::test]
    async fn held_parse_sees_a_handle_closed_meanwhile() {
        let (engine, gate) = InMemoryEngine::hold_parse();
        let key = engine
            .open(&EngineArgs::for_directory(Path::new("/documents/ipadic")))
            .await
            .unwrap();

        let mut parse = tokio_test::task::spawn(engine.parse(&key, "猫"));
        tokio_test::assert_pending!(parse.poll());

        engine.close(key).await.unwrap();
        gate.release();
        tokio_test::assert_ready_err!(parse.poll());
    }
}
