//! Build orchestration.
//!
//! A [`Pipeline`] ties the other modules together for one source/destination
//! pair:
//!
//! ```text
//! 1. Discover   source/  →  entry points + assets     (scan)
//! 2. Resolve    asset    →  first matching rule        (rules)
//! 3. Transform  bytes    →  chain output               (transform backend)
//! 4. Name       output   →  plain or hashed file name  (naming)
//! 5. Write      dest/    +  manifest.json              (types)
//! ```
//!
//! ## Processing Order
//!
//! Non-entry assets run first, sorted by logical name. Entry templates run
//! last, in discovery order, so every asset they reference is already in the
//! manifest when the `template` step rewrites their links.
//!
//! ## Failures
//!
//! Anything that prevents the run from starting (missing source directory,
//! bad configuration, an unusable destination) is a [`BuildError`]. Anything
//! that goes wrong with a single asset (unreadable file, failing transform,
//! output path collision, failed write) is recorded as an [`AssetFailure`]
//! and the run carries on with the next asset.

use crate::config::{BundleConfig, ConfigError};
use crate::mode::BuildMode;
use crate::naming::{NamingStrategy, resolve_naming_strategy, split_file_name};
use crate::rules::{PASSTHROUGH_RULE, TransformRule, TransformTable, build_transform_table};
use crate::scan::{
    AssetScan, DiscoveryError, EntryPoint, SourceAsset, collect_assets, discover_entry_points,
};
use crate::transform::{
    BuiltinBackend, TransformBackend, TransformContext, TransformError, TransformOutput,
};
use crate::types::{ManifestEntry, OutputManifest};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Cannot prepare destination {path}: {source}")]
    Destination { path: PathBuf, source: io::Error },
    #[error("Cannot write manifest {path}: {source}")]
    Manifest { path: PathBuf, source: io::Error },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One asset that could not be produced.
#[derive(Debug)]
pub struct AssetFailure {
    pub asset: String,
    pub error: TransformError,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct BuildOutcome {
    pub manifest: OutputManifest,
    /// Per-asset failures, in processing order.
    pub failures: Vec<AssetFailure>,
    /// Where the manifest JSON was written.
    pub manifest_path: PathBuf,
}

impl BuildOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What a run would do, without writing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub mode: BuildMode,
    /// Non-entry assets, in processing order.
    pub assets: Vec<PlannedAsset>,
    /// Entry templates, in discovery order.
    pub entries: Vec<PlannedAsset>,
    /// Paths under the source root that could not be listed.
    pub unreadable: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAsset {
    pub logical_name: String,
    /// Matched rule, or `None` for a pass-through copy.
    pub rule: Option<String>,
    /// Transform kinds that run in this mode.
    pub chain: Vec<&'static str>,
    /// Destination subdirectory, `/`-terminated or empty.
    pub output_dir: String,
}

/// Unit of work shared by assets and entry templates.
struct Job<'a> {
    logical_name: &'a str,
    path: &'a Path,
    target_dir: Option<&'a str>,
}

impl<'a> From<&'a SourceAsset> for Job<'a> {
    fn from(asset: &'a SourceAsset) -> Self {
        Self {
            logical_name: &asset.logical_name,
            path: &asset.path,
            target_dir: asset.target_dir.as_deref(),
        }
    }
}

impl<'a> From<&'a EntryPoint> for Job<'a> {
    fn from(entry: &'a EntryPoint) -> Self {
        Self {
            logical_name: &entry.name,
            path: &entry.path,
            target_dir: None,
        }
    }
}

/// Asset pipeline for one configuration and build mode.
pub struct Pipeline<B: TransformBackend> {
    config: BundleConfig,
    mode: BuildMode,
    table: TransformTable,
    naming: NamingStrategy,
    backend: B,
}

impl<B: TransformBackend> Pipeline<B> {
    /// Validate `config` and compile its rule table. No I/O.
    pub fn new(config: BundleConfig, mode: BuildMode, backend: B) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = build_transform_table(&config.rules)?;
        let naming = resolve_naming_strategy(mode, config.hash_length);
        Ok(Self {
            config,
            mode,
            table,
            naming,
            backend,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Discover and resolve everything under `source_dir` without writing.
    pub fn plan(&self, source_dir: &Path) -> Result<BuildPlan, BuildError> {
        let (entries, scan) = self.discover(source_dir)?;
        Ok(BuildPlan {
            mode: self.mode,
            assets: scan.assets.iter().map(|a| self.planned(a.into())).collect(),
            entries: entries.iter().map(|e| self.planned(e.into())).collect(),
            unreadable: scan.failures.into_iter().map(|f| f.logical_name).collect(),
        })
    }

    /// Build `source_dir` into `dest_dir` and write the manifest.
    pub fn run(&self, source_dir: &Path, dest_dir: &Path) -> Result<BuildOutcome, BuildError> {
        let (entries, scan) = self.discover(source_dir)?;
        info!(
            mode = %self.mode,
            entries = entries.len(),
            assets = scan.assets.len(),
            unreadable = scan.failures.len(),
            "discovered sources"
        );

        self.prepare_destination(dest_dir)?;

        let mut manifest = OutputManifest::new(self.mode);
        let mut failures = Vec::new();
        for failure in scan.failures {
            let error = TransformError::Read {
                path: failure.path,
                source: failure.source,
            };
            record(&failure.logical_name, Err(error), &mut manifest, &mut failures);
        }
        let assets = scan.assets;

        info!("transforming assets");
        for asset in &assets {
            let job = Job::from(asset);
            let result = self.produce(&job, &manifest, &manifest, dest_dir);
            record(job.logical_name, result, &mut manifest, &mut failures);
        }

        // Templates resolve against the asset set only, so a page's output
        // never depends on which other pages sort before it.
        info!("emitting pages");
        let asset_manifest = manifest.clone();
        for entry in &entries {
            let job = Job::from(entry);
            let result = self.produce(&job, &asset_manifest, &manifest, dest_dir);
            if record(job.logical_name, result, &mut manifest, &mut failures) {
                manifest.pages.push(entry.name.clone());
            }
        }

        let manifest_path = self.write_manifest(&manifest, dest_dir)?;
        info!(
            written = manifest.len(),
            failed = failures.len(),
            manifest = %manifest_path.display(),
            "build finished"
        );

        Ok(BuildOutcome {
            manifest,
            failures,
            manifest_path,
        })
    }

    /// Entry points in discovery order, and non-entry assets sorted by
    /// logical name.
    fn discover(&self, source_dir: &Path) -> Result<(Vec<EntryPoint>, AssetScan), BuildError> {
        let entries = discover_entry_points(source_dir, &self.config.entry_extension)?;
        let mut scan = collect_assets(source_dir, &self.config)?;
        scan.assets.sort_by(|a, b| a.logical_name.cmp(&b.logical_name));
        Ok((entries, scan))
    }

    fn planned(&self, job: Job<'_>) -> PlannedAsset {
        let rule = self.table.resolve(job.logical_name);
        PlannedAsset {
            logical_name: job.logical_name.to_string(),
            rule: rule.map(|r| r.name.clone()),
            chain: rule
                .map(|r| r.chain_for(self.mode).map(|s| s.kind()).collect())
                .unwrap_or_default(),
            output_dir: output_dir(&job, rule).to_string(),
        }
    }

    /// Read, transform, name, and write a single job.
    ///
    /// `visible` is what the transform chain may resolve references against;
    /// `written` is checked for output path collisions.
    fn produce(
        &self,
        job: &Job<'_>,
        visible: &OutputManifest,
        written: &OutputManifest,
        dest_dir: &Path,
    ) -> Result<ManifestEntry, TransformError> {
        let rule = self.table.resolve(job.logical_name);
        let contents = fs::read(job.path).map_err(|source| TransformError::Read {
            path: job.path.to_path_buf(),
            source,
        })?;
        let (stem, source_ext) = split_file_name(job.logical_name);

        let mut output = TransformOutput::new(contents, source_ext);
        if let Some(rule) = rule {
            let ctx = TransformContext {
                logical_name: job.logical_name,
                manifest: visible,
            };
            for spec in rule.chain_for(self.mode) {
                output = self.backend.apply(spec, &ctx, output)?;
            }
        }

        let dir = output_dir(job, rule);
        let path = format!(
            "{dir}{}",
            self.naming.file_name(stem, &output.extension, &output.contents)
        );
        self.claim(&path, written)?;

        // Variants keep the full source file name: logo.png -> logo.png.webp
        let variant_stem = match source_ext {
            "" => stem.to_string(),
            ext => format!("{stem}.{ext}"),
        };
        let mut variant_paths = Vec::with_capacity(output.variants.len());
        for (ext, bytes) in &output.variants {
            let variant_path = format!("{dir}{}", self.naming.file_name(&variant_stem, ext, bytes));
            if variant_path == path {
                return Err(TransformError::OutputCollision {
                    path: variant_path,
                    owner: job.logical_name.to_string(),
                });
            }
            self.claim(&variant_path, written)?;
            variant_paths.push((ext.clone(), variant_path, bytes));
        }

        // Variants first, so a failed asset never leaves its main file behind.
        let mut written_variants: Vec<&str> = Vec::with_capacity(variant_paths.len());
        for (_, variant_path, bytes) in &variant_paths {
            if let Err(error) = write_output(dest_dir, variant_path, bytes) {
                remove_outputs(dest_dir, &written_variants);
                return Err(error);
            }
            written_variants.push(variant_path);
        }
        if let Err(error) = write_output(dest_dir, &path, &output.contents) {
            remove_outputs(dest_dir, &written_variants);
            return Err(error);
        }

        let mut entry = ManifestEntry::new(
            path,
            self.naming.hash(&output.contents),
            rule.map_or(PASSTHROUGH_RULE, |r| r.name.as_str()),
        );
        for (ext, variant_path, _) in variant_paths {
            entry.variants.insert(ext, variant_path);
        }
        Ok(entry)
    }

    /// Fail if `path` is the manifest file or already belongs to another asset.
    fn claim(&self, path: &str, written: &OutputManifest) -> Result<(), TransformError> {
        if path == self.config.manifest_file {
            return Err(TransformError::OutputCollision {
                path: path.to_string(),
                owner: "the build manifest".to_string(),
            });
        }
        match written.owner_of(path) {
            Some(owner) => Err(TransformError::OutputCollision {
                path: path.to_string(),
                owner: owner.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Create the destination, emptying it first when `clean` is set.
    fn prepare_destination(&self, dest_dir: &Path) -> Result<(), BuildError> {
        let err = |source| BuildError::Destination {
            path: dest_dir.to_path_buf(),
            source,
        };
        if self.config.clean && dest_dir.exists() {
            info!(dest = %dest_dir.display(), "cleaning destination");
            for entry in fs::read_dir(dest_dir).map_err(err)? {
                let path = entry.map_err(err)?.path();
                if path.is_dir() {
                    fs::remove_dir_all(&path).map_err(err)?;
                } else {
                    fs::remove_file(&path).map_err(err)?;
                }
            }
        }
        fs::create_dir_all(dest_dir).map_err(err)
    }

    fn write_manifest(&self, manifest: &OutputManifest, dest_dir: &Path) -> Result<PathBuf, BuildError> {
        let path = dest_dir.join(&self.config.manifest_file);
        let mut json = serde_json::to_string_pretty(manifest)?;
        json.push('\n');
        fs::write(&path, json).map_err(|source| BuildError::Manifest {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Copy-pattern target, else the rule's directory, else the destination root.
fn output_dir<'a>(job: &Job<'a>, rule: Option<&'a TransformRule>) -> &'a str {
    match (job.target_dir, rule) {
        (Some(dir), _) => dir,
        (None, Some(rule)) => &rule.output_dir,
        (None, None) => "",
    }
}

/// Add a produced entry to the manifest or record the failure.
/// Returns `true` when the asset was written.
fn record(
    logical_name: &str,
    result: Result<ManifestEntry, TransformError>,
    manifest: &mut OutputManifest,
    failures: &mut Vec<AssetFailure>,
) -> bool {
    match result {
        Ok(entry) => {
            debug!(asset = logical_name, output = %entry.path, rule = %entry.rule, "written");
            manifest.insert(logical_name, entry);
            true
        }
        Err(error) => {
            warn!(asset = logical_name, %error, "asset failed");
            failures.push(AssetFailure {
                asset: logical_name.to_string(),
                error,
            });
            false
        }
    }
}

/// Best-effort removal of files written for an asset that then failed.
fn remove_outputs(dest_dir: &Path, rels: &[&str]) {
    for rel in rels {
        if let Err(error) = fs::remove_file(dest_dir.join(rel)) {
            warn!(output = *rel, %error, "cannot remove partial output");
        }
    }
}

fn write_output(dest_dir: &Path, rel: &str, contents: &[u8]) -> Result<(), TransformError> {
    let path = dest_dir.join(rel);
    let err = |source| TransformError::Write {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(err)?;
    }
    fs::write(&path, contents).map_err(err)
}

/// Build with the stock configuration and the built-in backend.
pub fn run(source_dir: &Path, dest_dir: &Path, mode: BuildMode) -> Result<BuildOutcome, BuildError> {
    Pipeline::new(BundleConfig::default(), mode, BuiltinBackend)?.run(source_dir, dest_dir)
}
