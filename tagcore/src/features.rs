//! Structured view of the tagger's raw output.
//!
//! [`Tagger::tokenize`](crate::tagger::Tagger::tokenize) returns the engine's
//! text verbatim. Callers that want part-of-speech and reading information
//! parse it here. Each non-empty line has the form
//!
//! ```text
//! surface: pos,pos1,pos2,pos3,conjugation1,conjugation2,base[,reading[,pronunciation]]
//! ```
//!
//! with `*` standing for an absent field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SURFACE_SEPARATOR: &str = ": ";
const WILDCARD: &str = "*";
const MIN_FIELDS: usize = 7;
const MAX_FIELDS: usize = 9;

/// A line of tagger output that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to parse a tagger result line: {line}")]
pub struct FeatureParseError {
    /// The offending line
    pub line: String,
}

/// Morphological features of a single token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFeature {
    /// Text of the token as it appears in the query
    pub surface: String,
    /// Part of speech
    pub pos: String,
    /// First part-of-speech subdivision
    pub pos_detail1: Option<String>,
    /// Second part-of-speech subdivision
    pub pos_detail2: Option<String>,
    /// Third part-of-speech subdivision
    pub pos_detail3: Option<String>,
    /// Conjugation type
    pub conjugation1: Option<String>,
    /// Conjugation form
    pub conjugation2: Option<String>,
    /// Dictionary (base) form
    pub dictionary_form: Option<String>,
    /// Reading
    pub reading: Option<String>,
    /// Pronunciation
    pub pronunciation: Option<String>,
}

fn optional_field(field: Option<&str>) -> Option<String> {
    match field {
        None | Some("" | WILDCARD) => None,
        Some(value) => Some(value.to_string()),
    }
}

fn parse_line(line: &str) -> Result<ParsedFeature, FeatureParseError> {
    let malformed = || FeatureParseError {
        line: line.to_string(),
    };

    let parts: Vec<&str> = line.split(SURFACE_SEPARATOR).collect();
    let [surface, feature] = parts.as_slice() else {
        return Err(malformed());
    };

    let fields: Vec<&str> = feature.split(',').collect();
    if !(MIN_FIELDS..=MAX_FIELDS).contains(&fields.len()) {
        return Err(malformed());
    }
    let field = |index: usize| optional_field(fields.get(index).copied());

    Ok(ParsedFeature {
        surface: (*surface).to_string(),
        pos: fields[0].to_string(),
        pos_detail1: field(1),
        pos_detail2: field(2),
        pos_detail3: field(3),
        conjugation1: field(4),
        conjugation2: field(5),
        dictionary_form: field(6),
        reading: field(7),
        pronunciation: field(8),
    })
}

/// Parses raw tagger output into one [`ParsedFeature`] per token.
///
/// Blank lines are skipped; any other malformed line fails the whole parse.
///
/// ```rust
/// use tagcore::features::parse_features;
///
/// let features = parse_features("猫: 名詞,一般,*,*,*,*,猫,ネコ,ネコ\n").unwrap();
/// assert_eq!(features[0].surface, "猫");
/// assert_eq!(features[0].pos_detail2, None);
/// assert_eq!(features[0].reading.as_deref(), Some("ネコ"));
/// ```
pub fn parse_features(raw: &str) -> Result<Vec<ParsedFeature>, FeatureParseError> {
    raw.trim()
        .lines()
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}
