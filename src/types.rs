//! Shared types produced by a build and consumed downstream.
//!
//! The [`OutputManifest`] is serialized to `manifest.json` in the destination
//! directory so other tools (an HTML emitter, a deploy script) can resolve
//! logical asset names to the files that were actually written.

use crate::mode::BuildMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from logical asset name to its written output.
///
/// `assets` is a `BTreeMap` and `pages` follows discovery order, so two runs
/// over the same input serialize to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputManifest {
    pub mode: BuildMode,
    /// Entry points, in emission order.
    pub pages: Vec<String>,
    pub assets: BTreeMap<String, ManifestEntry>,
}

/// One written asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Output path relative to the destination directory, `/`-separated.
    pub path: String,
    /// Content hash embedded in the file name (production only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Name of the rule that produced this entry, or `passthrough`.
    pub rule: String,
    /// Sibling outputs keyed by extension, e.g. `{"webp": "assets/img/logo.png.webp"}`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<String, String>,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>, hash: Option<String>, rule: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hash,
            rule: rule.into(),
            variants: BTreeMap::new(),
        }
    }
}

impl OutputManifest {
    pub fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            pages: Vec::new(),
            assets: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, logical_name: impl Into<String>, entry: ManifestEntry) {
        self.assets.insert(logical_name.into(), entry);
    }

    /// Output path for a logical name, if it was written.
    pub fn resolve(&self, logical_name: &str) -> Option<&str> {
        self.assets.get(logical_name).map(|e| e.path.as_str())
    }

    /// Logical name of the asset that owns an output path (main file or variant).
    pub fn owner_of(&self, output_path: &str) -> Option<&str> {
        self.assets
            .iter()
            .find(|(_, e)| e.path == output_path || e.variants.values().any(|v| v == output_path))
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
