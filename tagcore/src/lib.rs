//! `tagcore` - dictionary staging and lifecycle management for native
//! morphological taggers.
//!
//! A native tagger such as MeCab can only open a dictionary from a real
//! directory, while applications usually ship dictionaries inside a read-only
//! bundle. This crate stages the bundled dictionary into a writable
//! directory, opens the engine on it and then guards the resulting handle
//! with a strict lifecycle:
//!
//! - [`Tagger::initialize`] runs once and may not be re-entered
//! - [`Tagger::tokenize`] and [`Tagger::dispose`] wait for an in-flight
//!   initialization and share its outcome
//! - the handle is closed at most once and never used afterwards
//!
//! The bundle, the writable filesystem and the engine are collaborators
//! behind the [`BundleStore`], [`Filesystem`] and [`TaggerEngine`] traits.
//! `tagcore-memory` provides in-memory implementations for tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod barrier;
pub mod bundle;
pub mod config;
pub mod engine;
pub mod errors;
pub mod features;
pub mod filesystem;
pub mod manifest;
pub mod stager;
pub mod tagger;
pub mod types;

pub use barrier::ReadyBarrier;
pub use bundle::{BundleStore, DirectoryBundle};
pub use config::{CopyFailurePolicy, RuntimeConfigFile, StagerConfig};
pub use engine::{EngineArgs, TaggerEngine};
pub use errors::{
    EngineError, FilesystemError, FsOperation, InitializeRejection, TagcoreError, TagcoreResult,
};
pub use features::{parse_features, ParsedFeature};
pub use filesystem::{Filesystem, LocalFilesystem};
pub use manifest::DICTIONARY_FILES;
pub use stager::DictionaryStager;
pub use tagger::{Tagger, TaggerBuilder};
pub use types::{DictionaryId, TaggerState};
