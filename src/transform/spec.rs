//! Typed transform descriptions.
//!
//! Each [`TransformSpec`] variant carries its own option record, so a rule
//! chain in `bundle.toml` is checked at load time rather than passed around
//! as loose key/value maps:
//!
//! ```toml
//! chain = [
//!     { kind = "stylesheet", syntax = "sass" },
//!     { kind = "minify", syntax = "css" },
//! ]
//! ```

use crate::mode::BuildMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformSpec {
    /// Bytes through unchanged.
    Copy,
    /// Entry template; asset references are resolved through the manifest.
    Template(TemplateOptions),
    /// Stylesheet compilation. Output extension becomes `css`.
    Stylesheet(StylesheetOptions),
    /// Script compilation. Output extension becomes `js`.
    Script(ScriptOptions),
    /// Raster image handling, optionally emitting a WebP sibling.
    Image(ImageOptions),
    /// Minification. Production only.
    Minify(MinifyOptions),
    /// Lossy/lossless re-encoding of raster images. Production only.
    OptimizeImage(OptimizeOptions),
}

impl TransformSpec {
    /// Short identifier used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformSpec::Copy => "copy",
            TransformSpec::Template(_) => "template",
            TransformSpec::Stylesheet(_) => "stylesheet",
            TransformSpec::Script(_) => "script",
            TransformSpec::Image(_) => "image",
            TransformSpec::Minify(_) => "minify",
            TransformSpec::OptimizeImage(_) => "optimize_image",
        }
    }

    /// Optimization transforms only run in production builds.
    pub fn is_optimization(&self) -> bool {
        matches!(
            self,
            TransformSpec::Minify(_) | TransformSpec::OptimizeImage(_)
        )
    }

    pub fn applies_in(&self, mode: BuildMode) -> bool {
        !self.is_optimization() || mode.is_production()
    }

    /// Extension the output takes after this step, if it changes it.
    pub fn output_extension(&self) -> Option<&'static str> {
        match self {
            TransformSpec::Stylesheet(_) => Some("css"),
            TransformSpec::Script(_) => Some("js"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateOptions {
    /// Prefix prepended to resolved asset paths (`/` serves from the site root).
    pub public_path: String,
    pub rewrite_references: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            public_path: "/".to_string(),
            rewrite_references: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleSyntax {
    #[default]
    Css,
    Sass,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesheetOptions {
    pub syntax: StyleSyntax,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptOptions {
    /// Ask the compiler for source maps (development builds).
    pub source_maps: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageOptions {
    /// Also emit `<name>.<ext>.webp` next to the original.
    pub webp_variant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinifySyntax {
    Html,
    Css,
    Js,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinifyOptions {
    pub syntax: MinifySyntax,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizeOptions {
    /// JPEG quality (1-100). PNG output always uses best compression.
    pub quality: u8,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self { quality: 75 }
    }
}
