//! Source directory scanning.
//!
//! Finds the entry templates and every other file a build will process.
//!
//! ## Directory Structure
//!
//! ```text
//! src/                         # Source root (scanned non-recursively)
//! ├── bundle.toml              # Config (skipped)
//! ├── index.html               # Entry point
//! ├── about.html               # Entry point
//! ├── style.scss               # Asset
//! ├── app.js                   # Asset
//! ├── assets/
//! │   ├── img/                 # Copy pattern: walked recursively
//! │   └── fonts/               # Copy pattern: walked recursively
//! ├── static/                  # Copy pattern: mirrored into the output root
//! └── drafts/                  # Not a copy pattern: ignored
//! ```
//!
//! ## Ordering
//!
//! Entry points and top-level assets are sorted by file name, copy-pattern
//! files by path, so the same directory contents always produce the same
//! order. Hidden files (leading `.`) are skipped everywhere.

use crate::config::{BundleConfig, CopyPattern, DEFAULT_CONFIG_FILE};
use crate::rules::normalize_dir;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Source directory not found: {0}")]
    NotFound(PathBuf),
    #[error("Source path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Cannot read source directory {path}: {source}")]
    Unreadable { path: PathBuf, source: io::Error },
}

/// A template file that seeds one output page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// File name, e.g. `index.html`.
    pub name: String,
    pub path: PathBuf,
}

/// A file the build will transform and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAsset {
    /// Path relative to the source root, `/`-separated.
    pub logical_name: String,
    pub path: PathBuf,
    /// Output directory fixed by a copy pattern; `None` defers to the rule.
    pub target_dir: Option<String>,
}

/// List entry templates in `source_dir`, non-recursively, sorted by name.
///
/// `extension` is matched case-insensitively against the last extension.
/// Entries that cannot be listed are reported by [`collect_assets`].
pub fn discover_entry_points(
    source_dir: &Path,
    extension: &str,
) -> Result<Vec<EntryPoint>, DiscoveryError> {
    let (files, _) = list_top_level(source_dir)?;
    let entries = files
        .into_iter()
        .filter(|(name, _)| has_extension(name, extension))
        .map(|(name, path)| EntryPoint { name, path })
        .collect();
    Ok(entries)
}

/// A path under the source root that could not be inspected, e.g. an
/// unreadable directory inside a copy pattern or a symlink loop.
#[derive(Debug)]
pub struct ScanFailure {
    /// Best-effort logical name of the failing path.
    pub logical_name: String,
    pub path: PathBuf,
    pub source: io::Error,
}

/// Result of [`collect_assets`].
#[derive(Debug, Default)]
pub struct AssetScan {
    pub assets: Vec<SourceAsset>,
    /// Paths that could not be listed. Files whose contents cannot be read
    /// are still returned as assets and fail when they are read.
    pub failures: Vec<ScanFailure>,
}

/// Every non-entry file to process: top-level files of `source_dir` plus the
/// contents of the configured copy patterns.
///
/// Entry templates and the config file are excluded. Copy-pattern sources
/// that do not exist are skipped. Symlinks are followed.
pub fn collect_assets(source_dir: &Path, config: &BundleConfig) -> Result<AssetScan, DiscoveryError> {
    let (files, failures) = list_top_level(source_dir)?;
    let assets = files
        .into_iter()
        .filter(|(name, _)| {
            !has_extension(name, &config.entry_extension) && name != DEFAULT_CONFIG_FILE
        })
        .map(|(name, path)| SourceAsset {
            logical_name: name,
            path,
            target_dir: None,
        })
        .collect();

    let mut scan = AssetScan { assets, failures };
    for pattern in &config.copy {
        collect_copy_pattern(source_dir, pattern, &mut scan);
    }
    Ok(scan)
}

fn collect_copy_pattern(source_dir: &Path, pattern: &CopyPattern, scan: &mut AssetScan) {
    let from = source_dir.join(&pattern.from);
    if !from.is_dir() {
        debug!(from = %from.display(), "copy source missing, skipping");
        return;
    }
    let from_prefix = normalize_dir(&pattern.from);
    let to_prefix = normalize_dir(&pattern.to);
    let logical = |path: &Path| match path.strip_prefix(&from) {
        Ok(rel) => format!("{from_prefix}{}", to_slash(rel)),
        Err(_) => to_slash(path),
    };

    let walker = WalkDir::new(&from)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                let path = err.path().unwrap_or(from.as_path()).to_path_buf();
                // A dangling link is still a file the user asked for; reading
                // it reports the failure against the asset itself.
                if err.loop_ancestor().is_none() && is_dangling_link(&path) {
                    let logical_name = logical(&path);
                    let target_dir = target_dir_for(&to_prefix, &from_prefix, &logical_name);
                    scan.assets.push(SourceAsset {
                        logical_name,
                        path,
                        target_dir: Some(target_dir),
                    });
                } else {
                    scan.failures.push(ScanFailure {
                        logical_name: logical(&path),
                        source: err
                            .into_io_error()
                            .unwrap_or_else(|| io::Error::other("filesystem loop")),
                        path,
                    });
                }
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let logical_name = logical(entry.path());
        let target_dir = target_dir_for(&to_prefix, &from_prefix, &logical_name);
        scan.assets.push(SourceAsset {
            logical_name,
            path: entry.path().to_path_buf(),
            target_dir: Some(target_dir),
        });
    }
}

/// `to` joined with the asset's subdirectory below `from`.
fn target_dir_for(to_prefix: &str, from_prefix: &str, logical_name: &str) -> String {
    let rel = logical_name.strip_prefix(from_prefix).unwrap_or(logical_name);
    let rel_dir = match rel.rfind('/') {
        Some(pos) => &rel[..=pos],
        None => "",
    };
    format!("{to_prefix}{rel_dir}")
}

fn is_dangling_link(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) && fs::metadata(path).is_err()
}

/// `(file name, path)` for visible non-directory entries directly in `dir`,
/// sorted, plus the entries that could not be listed.
///
/// Symlinks are followed; a link whose target cannot be resolved is kept so
/// the failure surfaces when the file is read.
fn list_top_level(dir: &Path) -> Result<(Vec<(String, PathBuf)>, Vec<ScanFailure>), DiscoveryError> {
    if !dir.exists() {
        return Err(DiscoveryError::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(DiscoveryError::NotADirectory(dir.to_path_buf()));
    }
    let read = fs::read_dir(dir).map_err(|source| DiscoveryError::Unreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    let mut failures = Vec::new();
    for entry in read {
        let entry = match entry {
            Ok(e) => e,
            Err(source) => {
                failures.push(ScanFailure {
                    logical_name: ".".to_string(),
                    path: dir.to_path_buf(),
                    source,
                });
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path();
        if is_hidden(&name) || fs::metadata(&path).is_ok_and(|m| m.is_dir()) {
            continue;
        }
        files.push((name, path));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok((files, failures))
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
