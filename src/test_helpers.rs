//! Shared test utilities for the simple-bundle test suite.
//!
//! Provides source-tree builders, a real PNG encoder for image fixtures, and
//! manifest lookups that panic with the available names on a miss.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let outcome = pipeline::run(tmp.path(), &dest, BuildMode::Production).unwrap();
//!
//! let logo = find_entry(&outcome.manifest, "logo.png");
//! assert!(logo.variants.contains_key("webp"));
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::scan::{EntryPoint, SourceAsset};
use crate::types::{ManifestEntry, OutputManifest};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and add a generated `logo.png`.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    write_png(&tmp.path().join("logo.png"), 24, 16);
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `(relative path, contents)` pairs under `dir`, creating parents.
pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
    }
}

// =========================================================================
// Images
// =========================================================================

/// Encode a `width`×`height` RGB gradient as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, png_bytes(width, height)).unwrap();
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a manifest entry by logical name. Panics if not found.
pub fn find_entry<'a>(manifest: &'a OutputManifest, logical_name: &str) -> &'a ManifestEntry {
    manifest.assets.get(logical_name).unwrap_or_else(|| {
        let names: Vec<&str> = manifest.assets.keys().map(String::as_str).collect();
        panic!("asset '{logical_name}' not found. Available: {names:?}")
    })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Entry point file names in discovery order.
pub fn entry_names(entries: &[EntryPoint]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

/// Asset logical names in collection order.
pub fn logical_names(assets: &[SourceAsset]) -> Vec<&str> {
    assets.iter().map(|a| a.logical_name.as_str()).collect()
}

/// Manifest asset names in key order.
pub fn manifest_names(manifest: &OutputManifest) -> Vec<&str> {
    manifest.assets.keys().map(String::as_str).collect()
}
