//! Transform backend trait and shared types.
//!
//! The [`TransformBackend`] trait is the seam between the orchestrator and
//! whatever actually compiles, minifies, or re-encodes an asset. The pipeline
//! only decides *which* specs run, in which order, and where the result goes.
//!
//! The production implementation is
//! [`BuiltinBackend`](super::builtin::BuiltinBackend).

use super::spec::TransformSpec;
use crate::types::OutputManifest;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("{kind} transform failed: {message}")]
    Backend { kind: &'static str, message: String },
    #[error("Output path {path} already written by {owner}")]
    OutputCollision { path: String, owner: String },
}

/// What a backend knows about the asset it is transforming.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub logical_name: &'a str,
    /// Assets written so far. Complete for every non-entry asset by the time
    /// templates run.
    pub manifest: &'a OutputManifest,
}

/// Intermediate result threaded through a transform chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub contents: Vec<u8>,
    /// Current output extension (without the dot).
    pub extension: String,
    /// Extra files keyed by extension, e.g. `"webp"` for an image sibling.
    pub variants: BTreeMap<String, Vec<u8>>,
}

impl TransformOutput {
    pub fn new(contents: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            contents,
            extension: extension.into(),
            variants: BTreeMap::new(),
        }
    }
}

/// Trait for transform backends.
///
/// `apply` receives the output of the previous step and returns the input
/// for the next one. A backend must not touch the destination directory;
/// writing is the orchestrator's job.
pub trait TransformBackend {
    fn apply(
        &self,
        spec: &TransformSpec,
        ctx: &TransformContext<'_>,
        input: TransformOutput,
    ) -> Result<TransformOutput, TransformError>;
}
