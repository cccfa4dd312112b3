//! CLI output formatting for `check` and `build`.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Mode: production
//!
//! Assets
//! 001 app.js → assets/js/
//!     Rule: scripts (script, minify)
//! 002 notes.txt → ./
//!     Rule: passthrough
//!
//! Pages
//! 001 about.html → ./
//!     Rule: template (template, minify)
//! ```
//!
//! ## Build
//!
//! ```text
//! Assets
//! 001 app.js → assets/js/app.3f9a1c0e5b.js
//! 002 logo.png → assets/img/logo.9e2d.png
//!     webp: assets/img/logo.png.41c7.webp
//!
//! Pages
//! 001 index.html → index.8a1b.html
//!
//! Wrote 3 assets, 1 page (production)
//!
//! Warnings
//!     style.scss: stylesheet transform failed: ...
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::{BuildOutcome, BuildPlan, PlannedAsset};
use crate::rules::PASSTHROUGH_RULE;
use crate::types::OutputManifest;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `./` for the destination root, the directory itself otherwise.
fn display_dir(dir: &str) -> &str {
    if dir.is_empty() { "./" } else { dir }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Check
// ============================================================================

fn planned_lines(index: usize, asset: &PlannedAsset) -> Vec<String> {
    let rule = match (&asset.rule, asset.chain.is_empty()) {
        (Some(name), false) => format!("{name} ({})", asset.chain.join(", ")),
        (Some(name), true) => name.clone(),
        (None, _) => PASSTHROUGH_RULE.to_string(),
    };
    vec![
        format!(
            "{} {} → {}",
            format_index(index),
            asset.logical_name,
            display_dir(&asset.output_dir)
        ),
        format!("{}Rule: {rule}", indent(1)),
    ]
}

/// Format a build plan: every asset and page with its rule and chain.
pub fn format_check_output(plan: &BuildPlan) -> Vec<String> {
    let mut lines = vec![format!("Mode: {}", plan.mode)];

    if !plan.assets.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for (i, asset) in plan.assets.iter().enumerate() {
            lines.extend(planned_lines(i + 1, asset));
        }
    }

    lines.push(String::new());
    if plan.entries.is_empty() {
        lines.push("No pages found".to_string());
    } else {
        lines.push("Pages".to_string());
        for (i, entry) in plan.entries.iter().enumerate() {
            lines.extend(planned_lines(i + 1, entry));
        }
    }

    if !plan.unreadable.is_empty() {
        lines.push(String::new());
        lines.push("Warnings".to_string());
        for name in &plan.unreadable {
            lines.push(format!("{}{name}: cannot be read", indent(1)));
        }
    }

    lines
}

pub fn print_check_output(plan: &BuildPlan) {
    for line in format_check_output(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

fn written_lines(manifest: &OutputManifest, names: &[&str]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let Some(entry) = manifest.assets.get(*name) else {
            continue;
        };
        lines.push(format!("{} {} → {}", format_index(i + 1), name, entry.path));
        for (ext, path) in &entry.variants {
            lines.push(format!("{}{ext}: {path}", indent(1)));
        }
    }
    lines
}

/// Format a finished build: written outputs, a summary, and any failures.
pub fn format_build_output(outcome: &BuildOutcome) -> Vec<String> {
    let manifest = &outcome.manifest;
    let pages: Vec<&str> = manifest.pages.iter().map(String::as_str).collect();
    let assets: Vec<&str> = manifest
        .assets
        .keys()
        .map(String::as_str)
        .filter(|name| !pages.contains(name))
        .collect();

    let mut lines = Vec::new();
    if !assets.is_empty() {
        lines.push("Assets".to_string());
        lines.extend(written_lines(manifest, &assets));
        lines.push(String::new());
    }
    if !pages.is_empty() {
        lines.push("Pages".to_string());
        lines.extend(written_lines(manifest, &pages));
        lines.push(String::new());
    }

    lines.push(format!(
        "Wrote {}, {} ({})",
        plural(assets.len(), "asset"),
        plural(pages.len(), "page"),
        manifest.mode
    ));

    if !outcome.failures.is_empty() {
        lines.push(String::new());
        lines.push("Warnings".to_string());
        for failure in &outcome.failures {
            lines.push(format!("{}{}: {}", indent(1), failure.asset, failure.error));
        }
    }

    lines
}

pub fn print_build_output(outcome: &BuildOutcome) {
    for line in format_build_output(outcome) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::BuildMode;
    use crate::pipeline::AssetFailure;
    use crate::transform::TransformError;
    use crate::types::ManifestEntry;
    use std::path::PathBuf;

    fn planned(name: &str, rule: Option<&str>, chain: &[&'static str], dir: &str) -> PlannedAsset {
        PlannedAsset {
            logical_name: name.to_string(),
            rule: rule.map(String::from),
            chain: chain.to_vec(),
            output_dir: dir.to_string(),
        }
    }

    fn outcome(failures: Vec<AssetFailure>) -> BuildOutcome {
        let mut manifest = OutputManifest::new(BuildMode::Production);
        let mut logo = ManifestEntry::new("assets/img/logo.aa.png", Some("aa".into()), "images");
        logo.variants
            .insert("webp".into(), "assets/img/logo.png.bb.webp".into());
        manifest.insert("logo.png", logo);
        manifest.insert(
            "app.js",
            ManifestEntry::new("assets/js/app.cc.js", Some("cc".into()), "scripts"),
        );
        manifest.insert(
            "index.html",
            ManifestEntry::new("index.dd.html", Some("dd".into()), "template"),
        );
        manifest.pages.push("index.html".into());
        BuildOutcome {
            manifest,
            failures,
            manifest_path: PathBuf::from("dist/manifest.json"),
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_words() {
        assert_eq!(plural(1, "page"), "1 page");
        assert_eq!(plural(0, "page"), "0 pages");
        assert_eq!(plural(3, "asset"), "3 assets");
    }

    #[test]
    fn check_output_lists_rules_and_chains() {
        let plan = BuildPlan {
            mode: BuildMode::Production,
            assets: vec![
                planned("app.js", Some("scripts"), &["script", "minify"], "assets/js/"),
                planned("notes.txt", None, &[], ""),
            ],
            entries: vec![planned("index.html", Some("template"), &["template"], "")],
            unreadable: Vec::new(),
        };

        assert_eq!(
            format_check_output(&plan),
            vec![
                "Mode: production",
                "",
                "Assets",
                "001 app.js → assets/js/",
                "    Rule: scripts (script, minify)",
                "002 notes.txt → ./",
                "    Rule: passthrough",
                "",
                "Pages",
                "001 index.html → ./",
                "    Rule: template (template)",
            ]
        );
    }

    #[test]
    fn check_output_without_pages() {
        let plan = BuildPlan {
            mode: BuildMode::Development,
            assets: Vec::new(),
            entries: Vec::new(),
            unreadable: Vec::new(),
        };
        assert_eq!(
            format_check_output(&plan),
            vec!["Mode: development", "", "No pages found"]
        );
    }

    #[test]
    fn check_output_warns_about_unreadable_paths() {
        let plan = BuildPlan {
            mode: BuildMode::Development,
            assets: Vec::new(),
            entries: Vec::new(),
            unreadable: vec!["static/loop".into()],
        };
        assert_eq!(
            format_check_output(&plan),
            vec![
                "Mode: development",
                "",
                "No pages found",
                "",
                "Warnings",
                "    static/loop: cannot be read",
            ]
        );
    }

    #[test]
    fn build_output_lists_outputs_and_variants() {
        let lines = format_build_output(&outcome(Vec::new()));
        assert_eq!(
            lines,
            vec![
                "Assets",
                "001 app.js → assets/js/app.cc.js",
                "002 logo.png → assets/img/logo.aa.png",
                "    webp: assets/img/logo.png.bb.webp",
                "",
                "Pages",
                "001 index.html → index.dd.html",
                "",
                "Wrote 2 assets, 1 page (production)",
            ]
        );
    }

    #[test]
    fn build_output_reports_failures_as_warnings() {
        let failures = vec![AssetFailure {
            asset: "style.scss".into(),
            error: TransformError::Backend {
                kind: "stylesheet",
                message: "unexpected token".into(),
            },
        }];
        let lines = format_build_output(&outcome(failures));
        let tail = &lines[lines.len() - 3..];
        assert_eq!(
            tail,
            [
                "",
                "Warnings",
                "    style.scss: stylesheet transform failed: unexpected token",
            ]
        );
    }
}
