//! The fixed set of files a bundled dictionary must provide.

/// Files every staged dictionary must contain, in staging order.
pub const DICTIONARY_FILES: [&str; 9] = [
    "char.bin",
    "dicrc",
    "left-id.def",
    "matrix.bin",
    "pos-id.def",
    "rewrite.def",
    "right-id.def",
    "sys.dic",
    "unk.dic",
];

/// Default name of the runtime configuration file synthesized next to the
/// staged dictionary.
pub const DEFAULT_RUNTIME_CONFIG_FILE: &str = "mecabrc";

/// Joins a manifest entry onto a bundle-relative dictionary root.
///
/// Bundle paths always use `/`, whatever the host separator.
pub fn bundle_path(dictionary: &str, file_name: &str) -> String {
    format!("{dictionary}/{file_name}")
}
