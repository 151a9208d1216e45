//! Tagger lifecycle management.
//!
//! A [`Tagger`] owns one native tagger handle and the state machine guarding
//! it:
//!
//! ```text
//! Uninitialized --initialize--> Initializing --ok--> Initialized --dispose--> Disposed
//!                                     |
//!                                     +--error--> Failed
//! ```
//!
//! `initialize` is the only way out of `Uninitialized` and may run only once.
//! `tokenize` and `dispose` reject the `Uninitialized`, `Disposed` and
//! `Failed` states immediately; while initialization is in flight they wait
//! on a [`ReadyBarrier`] and then observe its outcome.
//!
//! The state lock is only ever held between suspension points, never across
//! an `.await`. Parses in flight hold a read guard on a separate async lock;
//! `dispose` takes the write guard before closing, so the handle is never
//! closed underneath a running `parse`.

use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::barrier::ReadyBarrier;
use crate::bundle::BundleStore;
use crate::config::StagerConfig;
use crate::engine::TaggerEngine;
use crate::errors::{InitializeRejection, TagcoreError, TagcoreResult};
use crate::filesystem::Filesystem;
use crate::stager::DictionaryStager;
use crate::types::{DictionaryId, TaggerState};

/// Internal lifecycle; the handle lives inside the only state that owns it.
#[derive(Debug)]
enum Lifecycle<H> {
    Uninitialized,
    Initializing,
    Initialized(H),
    Disposed,
    Failed,
}

impl<H> Lifecycle<H> {
    const fn state(&self) -> TaggerState {
        match self {
            Self::Uninitialized => TaggerState::Uninitialized,
            Self::Initializing => TaggerState::Initializing,
            Self::Initialized(_) => TaggerState::Initialized,
            Self::Disposed => TaggerState::Disposed,
            Self::Failed => TaggerState::Failed,
        }
    }

    const fn initialize_rejection(&self) -> Option<InitializeRejection> {
        match self {
            Self::Uninitialized => None,
            Self::Initializing => Some(InitializeRejection::Initializing),
            Self::Initialized(_) => Some(InitializeRejection::Initialized),
            Self::Disposed => Some(InitializeRejection::Disposed),
            Self::Failed => Some(InitializeRejection::Failed),
        }
    }

    /// Error for `tokenize`/`dispose` calls that must not wait on the barrier.
    const fn usage_error(&self) -> Option<TagcoreError> {
        match self {
            Self::Uninitialized => Some(TagcoreError::NotInitialized),
            Self::Disposed => Some(TagcoreError::Disposed),
            Self::Failed => Some(TagcoreError::FailedState),
            Self::Initializing | Self::Initialized(_) => None,
        }
    }
}

/// Marks the tagger failed if `initialize` is dropped before it settles.
struct SettleOnDrop<'a, H> {
    state: &'a Mutex<Lifecycle<H>>,
    ready: &'a ReadyBarrier,
    armed: bool,
}

impl<H> SettleOnDrop<'_, H> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<H> Drop for SettleOnDrop<'_, H> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Initialization dropped before completion");
            *self.state.lock() = Lifecycle::Failed;
            self.ready.settle(Err(TagcoreError::Interrupted));
        }
    }
}

/// Lifecycle controller for a single native tagger.
///
/// # Example
///
/// ```rust,ignore
/// let tagger = Tagger::builder()
///     .config(StagerConfig::asset_bundle("/data/documents"))
///     .bundle(assets)
///     .filesystem(LocalFilesystem::new())
///     .engine(mecab)
///     .build()?;
///
/// tagger.initialize("ipadic").await?;
/// let raw = tagger.tokenize("これは猫です。").await?;
/// tagger.dispose().await?;
/// ```
pub struct Tagger<B, F, E>
where
    E: TaggerEngine,
{
    stager: DictionaryStager<B, F>,
    engine: E,
    state: Mutex<Lifecycle<E::Handle>>,
    ready: ReadyBarrier,
    in_flight: RwLock<()>,
}

impl<B, F, E> Tagger<B, F, E>
where
    B: BundleStore,
    F: Filesystem,
    E: TaggerEngine,
{
    /// Creates an uninitialized tagger from its collaborators.
    pub fn new(stager: DictionaryStager<B, F>, engine: E) -> Self {
        Self {
            stager,
            engine,
            state: Mutex::new(Lifecycle::Uninitialized),
            ready: ReadyBarrier::new(),
            in_flight: RwLock::new(()),
        }
    }

    /// Starts building a tagger whose collaborators are checked at
    /// [`TaggerBuilder::build`].
    pub const fn builder() -> TaggerBuilder<B, F, E> {
        TaggerBuilder::new()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaggerState {
        self.state.lock().state()
    }

    /// The engine this tagger drives.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Stages `dictionary` and opens the engine on it.
    ///
    /// Fails with [`TagcoreError::InvalidTransition`] unless the tagger is
    /// `Uninitialized`. Any other failure leaves the tagger `Failed` and is
    /// also delivered to every `tokenize`/`dispose` call waiting on it.
    #[instrument(skip(self))]
    pub async fn initialize(&self, dictionary: &str) -> TagcoreResult<()> {
        {
            let mut state = self.state.lock();
            if let Some(rejection) = state.initialize_rejection() {
                warn!(%rejection, "Rejected initialize call");
                return Err(TagcoreError::InvalidTransition(rejection));
            }
            *state = Lifecycle::Initializing;
        }

        let guard = SettleOnDrop {
            state: &self.state,
            ready: &self.ready,
            armed: true,
        };

        let outcome = self.open(dictionary).await;
        guard.disarm();

        match outcome {
            Ok(handle) => {
                debug!(?handle, "Tagger opened");
                *self.state.lock() = Lifecycle::Initialized(handle);
                self.ready.settle(Ok(()));
                info!("Tagger initialized");
                Ok(())
            }
            Err(failure) => {
                *self.state.lock() = Lifecycle::Failed;
                self.ready.settle(Err(failure.clone()));
                error!(error = %failure, "Tagger initialization failed");
                Err(failure)
            }
        }
    }

    /// Tags `query` and returns the engine's raw output unchanged.
    ///
    /// Waits for an in-flight `initialize` and reports its failure if it
    /// fails.
    #[instrument(skip(self))]
    pub async fn tokenize(&self, query: &str) -> TagcoreResult<String> {
        self.ensure_usable()?;
        self.ready.wait().await?;
        let _parsing = self.in_flight.read().await;

        let handle = {
            let state = self.state.lock();
            match &*state {
                Lifecycle::Initialized(handle) => handle.clone(),
                other => return Err(other.usage_error().unwrap_or(TagcoreError::NotInitialized)),
            }
        };

        Ok(self.engine.parse(&handle, query).await?)
    }

    /// Closes the engine handle. The tagger is `Disposed` afterwards, even if
    /// the engine reports an error while closing.
    ///
    /// Waits for an in-flight `initialize` and reports its failure if it
    /// fails, then for every `tokenize` already parsing.
    #[instrument(skip(self))]
    pub async fn dispose(&self) -> TagcoreResult<()> {
        self.ensure_usable()?;
        self.ready.wait().await?;
        let _closing = self.in_flight.write().await;

        let handle = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, Lifecycle::Disposed) {
                Lifecycle::Initialized(handle) => handle,
                other => {
                    let failure = other.usage_error().unwrap_or(TagcoreError::NotInitialized);
                    *state = other;
                    return Err(failure);
                }
            }
        };

        self.engine.close(handle).await?;
        info!("Tagger disposed");
        Ok(())
    }

    fn ensure_usable(&self) -> TagcoreResult<()> {
        self.state.lock().usage_error().map_or(Ok(()), Err)
    }

    async fn open(&self, dictionary: &str) -> TagcoreResult<E::Handle> {
        let dictionary = DictionaryId::try_new(dictionary)
            .map_err(|_| TagcoreError::InvalidDictionaryId(dictionary.to_string()))?;
        let staged_dir = self.stager.stage(&dictionary).await?;
        let args = self.stager.config().engine_args(&staged_dir);
        debug!(args = %args.to_param_string(), "Opening tagger");
        Ok(self.engine.open(&args).await?)
    }
}

impl<B, F, E> Drop for Tagger<B, F, E>
where
    E: TaggerEngine,
{
    fn drop(&mut self) {
        if let Lifecycle::Initialized(handle) = self.state.get_mut() {
            warn!(?handle, "Tagger dropped without dispose, leaking its handle");
        }
    }
}

/// Builder for [`Tagger`] that reports missing collaborators as
/// [`TagcoreError::Configuration`] instead of failing on first use.
pub struct TaggerBuilder<B, F, E> {
    config: Option<StagerConfig>,
    bundle: Option<B>,
    filesystem: Option<F>,
    engine: Option<E>,
}

impl<B, F, E> TaggerBuilder<B, F, E>
where
    B: BundleStore,
    F: Filesystem,
    E: TaggerEngine,
{
    /// Creates an empty builder.
    pub const fn new() -> Self {
        Self {
            config: None,
            bundle: None,
            filesystem: None,
            engine: None,
        }
    }

    /// Sets the staging configuration.
    #[must_use]
    pub fn config(mut self, config: StagerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the dictionary bundle.
    #[must_use]
    pub fn bundle(mut self, bundle: B) -> Self {
        self.bundle = Some(bundle);
        self
    }

    /// Sets the writable filesystem.
    #[must_use]
    pub fn filesystem(mut self, filesystem: F) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    /// Sets the tagger engine.
    #[must_use]
    pub fn engine(mut self, engine: E) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the tagger engine if one is available, e.g. when the native
    /// library may not have been linked into this build.
    #[must_use]
    pub fn maybe_engine(mut self, engine: Option<E>) -> Self {
        self.engine = engine;
        self
    }

    /// Builds the tagger, failing if any collaborator is missing.
    pub fn build(self) -> TagcoreResult<Tagger<B, F, E>> {
        let engine = self.engine.ok_or_else(|| {
            TagcoreError::Configuration(
                "no tagger engine is available; make sure the native tagger library is linked \
                 and the application was rebuilt after installing it"
                    .to_string(),
            )
        })?;
        let config = self.config.ok_or_else(|| {
            TagcoreError::Configuration("no stager configuration was provided".to_string())
        })?;
        let bundle = self.bundle.ok_or_else(|| {
            TagcoreError::Configuration("no dictionary bundle was provided".to_string())
        })?;
        let filesystem = self.filesystem.ok_or_else(|| {
            TagcoreError::Configuration("no writable filesystem was provided".to_string())
        })?;

        Ok(Tagger::new(
            DictionaryStager::new(bundle, filesystem, config),
            engine,
        ))
    }
}

impl<B, F, E> Default for TaggerBuilder<B, F, E>
where
    B: BundleStore,
    F: Filesystem,
    E: TaggerEngine,
{
    fn default() -> Self {
        Self::new()
    }
}
