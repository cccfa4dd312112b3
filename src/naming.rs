//! Output file naming.
//!
//! Development builds keep file names readable (`style.css`); production
//! builds embed a content hash for cache-busting (`style.3f9a1c0e5b.css`).
//! The hash is the leading hex digits of the SHA-256 of the *output* bytes,
//! so unchanged content always gets the same name and any change gets a new
//! one.
//!
//! | Mode | `("logo", "png", bytes)` |
//! |---|---|
//! | development | `logo.png` |
//! | production | `logo.<hash>.png` |

use crate::mode::BuildMode;
use sha2::{Digest, Sha256};

/// Full SHA-256 hex length; the upper bound for `hash_length`.
pub const MAX_HASH_LENGTH: usize = 64;

/// Pure mapping from (stem, extension, contents) to an output file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingStrategy {
    Plain,
    Hashed { length: usize },
}

/// Pick the naming strategy for a build mode.
///
/// `hash_length` is clamped to `1..=64`; config validation rejects values
/// outside that range before a strategy is ever built.
pub fn resolve_naming_strategy(mode: BuildMode, hash_length: usize) -> NamingStrategy {
    match mode {
        BuildMode::Development => NamingStrategy::Plain,
        BuildMode::Production => NamingStrategy::Hashed {
            length: hash_length.clamp(1, MAX_HASH_LENGTH),
        },
    }
}

impl NamingStrategy {
    /// Output file name for an asset.
    ///
    /// An empty extension yields no trailing dot.
    pub fn file_name(&self, stem: &str, extension: &str, contents: &[u8]) -> String {
        let hash = self.hash(contents);
        match (hash, extension.is_empty()) {
            (None, true) => stem.to_string(),
            (None, false) => format!("{stem}.{extension}"),
            (Some(h), true) => format!("{stem}.{h}"),
            (Some(h), false) => format!("{stem}.{h}.{extension}"),
        }
    }

    /// The hash this strategy embeds for `contents`, if any.
    pub fn hash(&self, contents: &[u8]) -> Option<String> {
        match self {
            NamingStrategy::Plain => None,
            NamingStrategy::Hashed { length } => {
                let mut hex = content_hash(contents);
                hex.truncate(*length);
                Some(hex)
            }
        }
    }
}

/// SHA-256 of `contents` as a lowercase hex string.
pub fn content_hash(contents: &[u8]) -> String {
    format!("{:x}", Sha256::digest(contents))
}

/// Split a logical name's file name into `(stem, extension)`.
///
/// Only the last dot counts, and a leading dot does not start an extension:
/// - `"style.scss"` → `("style", "scss")`
/// - `"assets/img/a.b.png"` → `("a.b", "png")`
/// - `"LICENSE"` → `("LICENSE", "")`
/// - `".htaccess"` → `(".htaccess", "")`
pub fn split_file_name(logical_name: &str) -> (&str, &str) {
    let file = logical_name.rsplit('/').next().unwrap_or(logical_name);
    match file.rfind('.') {
        Some(0) | None => (file, ""),
        Some(pos) => (&file[..pos], &file[pos + 1..]),
    }
}
