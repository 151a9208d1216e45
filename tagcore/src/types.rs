//! Core types for tagcore.
//!
//! Identifiers use smart constructors so a value that exists is already
//! normalized, following the "parse, don't validate" principle.

use std::fmt;

use nutype::nutype;
use serde::{Deserialize, Serialize};

fn strip_separators(raw: &str) -> String {
    raw.trim_matches(|c| c == '/' || c == '\\').to_string()
}

/// Identifier of a bundled dictionary, e.g. `ipadic`.
///
/// Leading and trailing path separators (`/` and `\`) are stripped on
/// construction, so `"/ipadic/"` and `"ipadic"` name the same dictionary.
/// The identifier is both the bundle-relative source root and the name of
/// the staged directory.
#[nutype(
    sanitize(with = |raw: String| strip_separators(&raw)),
    validate(not_empty),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct DictionaryId(String);

/// Observable lifecycle state of a [`Tagger`](crate::tagger::Tagger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaggerState {
    /// Created, `initialize` not yet called
    Uninitialized,
    /// `initialize` in flight
    Initializing,
    /// Handle open and ready for `tokenize`
    Initialized,
    /// Handle closed; terminal
    Disposed,
    /// Initialization failed; terminal
    Failed,
}

impl TaggerState {
    /// Whether no further transition can leave this state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Disposed | Self::Failed)
    }
}

impl fmt::Display for TaggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Disposed => "disposed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
