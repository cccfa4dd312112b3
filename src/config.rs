//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `bundle.toml`. Stock defaults are
//! the base layer; the user file is merged on top of them, so it only needs
//! the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! entry_extension = "html"        # Template files that seed output pages
//! hash_length = 20                # Hex digits of the content hash (production)
//! manifest_file = "manifest.json" # Written into the destination directory
//! clean = false                   # Empty the destination before writing
//!
//! [[copy]]                        # Directories copied (and transformed) recursively
//! from = "assets/img"
//! to = "assets/img"
//!
//! [[rules]]                       # First matching rule wins
//! name = "sass"
//! regex = '\.s[ac]ss$'            # or: extensions = ["scss", "sass"]
//! output_dir = "assets/css/"
//! chain = [
//!     { kind = "stylesheet", syntax = "sass" },
//!     { kind = "minify", syntax = "css" },
//! ]
//! ```
//!
//! ## Merging
//!
//! Tables merge key-by-key; arrays and scalars replace. A user file that
//! declares `[[rules]]` therefore replaces the whole stock rule table, which
//! keeps rule order (and so tie-breaking) entirely in the user's hands.
//!
//! Unknown keys are rejected to catch typos early.

use crate::naming::MAX_HASH_LENGTH;
use crate::transform::spec::{
    ImageOptions, MinifyOptions, MinifySyntax, OptimizeOptions, ScriptOptions, StyleSyntax,
    StylesheetOptions, TemplateOptions, TransformSpec,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path};
use thiserror::Error;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "bundle.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid pattern in rule '{rule}': {source}")]
    Pattern {
        rule: String,
        source: regex::Error,
    },
}

/// Pipeline configuration loaded from `bundle.toml`.
///
/// Immutable once loaded; the build mode is supplied separately at
/// [`Pipeline::new`](crate::pipeline::Pipeline::new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundleConfig {
    /// Extension (without dot) of entry templates in the source root.
    pub entry_extension: String,
    /// Hex digits of the content hash embedded in production file names.
    pub hash_length: usize,
    /// Manifest file name, written into the destination directory.
    pub manifest_file: String,
    /// Remove the destination directory's contents before writing.
    pub clean: bool,
    /// Directories copied recursively into the destination.
    pub copy: Vec<CopyPattern>,
    /// Transform rules, in match order.
    pub rules: Vec<RuleConfig>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            entry_extension: "html".to_string(),
            hash_length: 20,
            manifest_file: "manifest.json".to_string(),
            clean: false,
            copy: stock_copy_patterns(),
            rules: stock_rules(),
        }
    }
}

/// Source directory (relative to the source root) mirrored into `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyPattern {
    pub from: String,
    #[serde(default)]
    pub to: String,
}

/// A transform rule as written in `bundle.toml`.
///
/// Exactly one of `extensions` or `regex` must be set; this is checked when
/// the table is built (see [`crate::rules::build_transform_table`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Destination subdirectory, e.g. `assets/css/`. Empty means the root.
    #[serde(default)]
    pub output_dir: String,
    pub chain: Vec<TransformSpec>,
}

impl BundleConfig {
    /// Validate scalar values and copy patterns.
    ///
    /// Rules are validated when they are compiled into a
    /// [`TransformTable`](crate::rules::TransformTable).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ext = &self.entry_extension;
        if ext.is_empty() || ext.contains('.') || ext.contains('/') {
            return Err(ConfigError::Validation(
                "entry_extension must be a bare extension like \"html\"".into(),
            ));
        }
        if self.hash_length == 0 || self.hash_length > MAX_HASH_LENGTH {
            return Err(ConfigError::Validation(format!(
                "hash_length must be 1-{MAX_HASH_LENGTH}"
            )));
        }
        if self.manifest_file.is_empty()
            || self.manifest_file.contains('/')
            || self.manifest_file.contains('\\')
        {
            return Err(ConfigError::Validation(
                "manifest_file must be a plain file name".into(),
            ));
        }
        for pattern in &self.copy {
            if pattern.from.is_empty() {
                return Err(ConfigError::Validation(
                    "copy.from must not be empty".into(),
                ));
            }
            if !is_relative_inside(&pattern.from) || !is_relative_inside(&pattern.to) {
                return Err(ConfigError::Validation(format!(
                    "copy paths must be relative and stay inside their root: {} -> {}",
                    pattern.from, pattern.to
                )));
            }
        }
        for rule in &self.rules {
            if !is_relative_inside(&rule.output_dir) {
                return Err(ConfigError::Validation(format!(
                    "rule '{}': output_dir must be relative and stay inside the destination",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}

/// `true` for relative paths without `..` components. Empty counts as relative.
fn is_relative_inside(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn stock_copy_patterns() -> Vec<CopyPattern> {
    [
        ("assets/img", "assets/img"),
        ("assets/fonts", "assets/fonts"),
        ("static", ""),
        ("assets/video", "assets/video"),
    ]
    .into_iter()
    .map(|(from, to)| CopyPattern {
        from: from.to_string(),
        to: to.to_string(),
    })
    .collect()
}

fn minify(syntax: MinifySyntax) -> TransformSpec {
    TransformSpec::Minify(MinifyOptions { syntax })
}

fn ext_rule(name: &str, exts: &[&str], output_dir: &str, chain: Vec<TransformSpec>) -> RuleConfig {
    RuleConfig {
        name: name.to_string(),
        extensions: exts.iter().map(|e| e.to_string()).collect(),
        regex: None,
        output_dir: output_dir.to_string(),
        chain,
    }
}

fn regex_rule(name: &str, regex: &str, output_dir: &str, chain: Vec<TransformSpec>) -> RuleConfig {
    RuleConfig {
        name: name.to_string(),
        extensions: Vec::new(),
        regex: Some(regex.to_string()),
        output_dir: output_dir.to_string(),
        chain,
    }
}

/// The stock rule table, in match order.
pub fn stock_rules() -> Vec<RuleConfig> {
    vec![
        ext_rule(
            "template",
            &["html"],
            "",
            vec![
                TransformSpec::Template(TemplateOptions::default()),
                minify(MinifySyntax::Html),
            ],
        ),
        regex_rule(
            "styles",
            r"\.css$",
            "assets/css/",
            vec![
                TransformSpec::Stylesheet(StylesheetOptions {
                    syntax: StyleSyntax::Css,
                }),
                minify(MinifySyntax::Css),
            ],
        ),
        regex_rule(
            "sass",
            r"\.s[ac]ss$",
            "assets/css/",
            vec![
                TransformSpec::Stylesheet(StylesheetOptions {
                    syntax: StyleSyntax::Sass,
                }),
                minify(MinifySyntax::Css),
            ],
        ),
        regex_rule(
            "images",
            r"(?i)\.(jpe?g|png)$",
            "assets/img/",
            vec![
                TransformSpec::Image(ImageOptions { webp_variant: true }),
                TransformSpec::OptimizeImage(OptimizeOptions::default()),
            ],
        ),
        regex_rule(
            "fonts",
            r"\.(woff2?|ttf|eot|svg)$",
            "assets/fonts/",
            vec![TransformSpec::Copy],
        ),
        ext_rule("xml", &["xml"], "assets/data/", vec![TransformSpec::Copy]),
        ext_rule("csv", &["csv"], "assets/data/", vec![TransformSpec::Copy]),
        ext_rule(
            "scripts",
            &["js"],
            "assets/js/",
            vec![
                TransformSpec::Script(ScriptOptions { source_maps: true }),
                minify(MinifySyntax::Js),
            ],
        ),
    ]
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BundleConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (including arrays) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BundleConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BundleConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `bundle.toml` path, falling back to stock defaults
/// when the file does not exist.
pub fn load_config(path: &Path) -> Result<BundleConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `bundle.toml`.
///
/// Used by the `gen-config` CLI command. Parses back to
/// [`BundleConfig::default`].
pub fn stock_config_toml() -> &'static str {
    r##"# simple-bundle configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.

# Extension (without the dot) of entry templates in the source root.
# Each one becomes an output page, emitted in file-name order.
entry_extension = "html"

# Number of hex digits of the SHA-256 content hash embedded in
# production file names (1-64). Development builds never hash.
hash_length = 20

# Manifest written into the destination directory after every build.
manifest_file = "manifest.json"

# Empty the destination directory before writing (also: build --clean).
clean = false

# ---------------------------------------------------------------------------
# Copy patterns
# ---------------------------------------------------------------------------
# Directories (relative to the source root) walked recursively. Their files
# still go through the rule table but keep their layout under `to`.
# Missing directories are skipped.
[[copy]]
from = "assets/img"
to = "assets/img"

[[copy]]
from = "assets/fonts"
to = "assets/fonts"

[[copy]]
from = "static"
to = ""

[[copy]]
from = "assets/video"
to = "assets/video"

# ---------------------------------------------------------------------------
# Transform rules
# ---------------------------------------------------------------------------
# The first rule whose pattern matches a file wins. Patterns are either
# `extensions = [...]` (case-insensitive) or a `regex` tested against the
# path relative to the source root. Files matching no rule are copied
# through unchanged.
#
# Transform kinds:
#   copy                                  bytes through
#   template        public_path, rewrite_references
#   stylesheet      syntax = "css" | "sass"          (output: .css)
#   script          source_maps                      (output: .js)
#   image           webp_variant
#   minify          syntax = "html" | "css" | "js"   (production only)
#   optimize_image  quality = 1-100                  (production only)
#
# Declaring any [[rules]] replaces this whole table.

[[rules]]
name = "template"
extensions = ["html"]
output_dir = ""
chain = [
    { kind = "template", public_path = "/", rewrite_references = true },
    { kind = "minify", syntax = "html" },
]

[[rules]]
name = "styles"
regex = '\.css$'
output_dir = "assets/css/"
chain = [
    { kind = "stylesheet", syntax = "css" },
    { kind = "minify", syntax = "css" },
]

[[rules]]
name = "sass"
regex = '\.s[ac]ss$'
output_dir = "assets/css/"
chain = [
    { kind = "stylesheet", syntax = "sass" },
    { kind = "minify", syntax = "css" },
]

[[rules]]
name = "images"
regex = '(?i)\.(jpe?g|png)$'
output_dir = "assets/img/"
chain = [
    { kind = "image", webp_variant = true },
    { kind = "optimize_image", quality = 75 },
]

[[rules]]
name = "fonts"
regex = '\.(woff2?|ttf|eot|svg)$'
output_dir = "assets/fonts/"
chain = [{ kind = "copy" }]

[[rules]]
name = "xml"
extensions = ["xml"]
output_dir = "assets/data/"
chain = [{ kind = "copy" }]

[[rules]]
name = "csv"
extensions = ["csv"]
output_dir = "assets/data/"
chain = [{ kind = "copy" }]

[[rules]]
name = "scripts"
extensions = ["js"]
output_dir = "assets/js/"
chain = [
    { kind = "script", source_maps = true },
    { kind = "minify", syntax = "js" },
]
"##
}
