//! HTML emission: resolving asset references in entry templates.
//!
//! Templates are written against logical names (`<link href="style.scss">`,
//! `<img src="./logo.png">`). By the time templates run, every other asset is
//! in the [`OutputManifest`], so each `src`/`href` value naming a logical
//! asset is replaced with its output path under the public path:
//!
//! ```text
//! <link href="style.scss">   →  <link href="/assets/css/style.1a2b3c.css">
//! <img src="./logo.png#x">   →  <img src="/assets/img/logo.9f8e7d.png#x">
//! <a href="https://x.dev">   →  unchanged
//! ```
//!
//! Values that do not name a manifest entry are left as written.
//!
//! ## Links Between Pages
//!
//! Templates resolve against the asset set only, and pages are not part of
//! it. A link from one page to another (`<a href="about.html">`) is therefore
//! left as written. In production every page name carries a content hash, so
//! such links point at a file that is not emitted. Sites that link between
//! pages need a server rewrite from the plain name to the manifest's `path`,
//! or a development build.

use crate::types::OutputManifest;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static REFERENCE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(src|href)(\s*=\s*)(?:"([^"]*)"|'([^']*)')"#)
        .expect("reference pattern is valid")
});

/// Rewrite `src`/`href` attribute values that name manifest assets.
pub fn rewrite_references(html: &str, manifest: &OutputManifest, public_path: &str) -> String {
    REFERENCE_ATTR
        .replace_all(html, |caps: &Captures| {
            let (value, quote) = match (caps.get(3), caps.get(4)) {
                (Some(v), _) => (v.as_str(), '"'),
                (None, Some(v)) => (v.as_str(), '\''),
                (None, None) => return caps[0].to_string(),
            };
            match resolve_reference(value, manifest, public_path) {
                Some(resolved) => format!("{}{}{quote}{resolved}{quote}", &caps[1], &caps[2]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Resolved URL for a reference, or `None` when it names no manifest asset.
///
/// Query strings and fragments are carried over.
pub fn resolve_reference(value: &str, manifest: &OutputManifest, public_path: &str) -> Option<String> {
    if value.starts_with("//") || value.contains("://") {
        return None;
    }
    let split = value.find(|c: char| c == '?' || c == '#').unwrap_or(value.len());
    let (target, suffix) = value.split_at(split);
    let key = target.strip_prefix("./").unwrap_or(target);
    let key = key.strip_prefix('/').unwrap_or(key);

    let path = manifest.resolve(key)?;
    Some(format!("{}{suffix}", public_url(public_path, path)))
}

/// Join the public path and an output path with exactly one `/` between them.
pub fn public_url(public_path: &str, output_path: &str) -> String {
    if public_path.is_empty() || public_path.ends_with('/') {
        format!("{public_path}{output_path}")
    } else {
        format!("{public_path}/{output_path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::BuildMode;
    use crate::types::ManifestEntry;

    fn manifest() -> OutputManifest {
        let mut m = OutputManifest::new(BuildMode::Production);
        m.insert(
            "style.scss",
            ManifestEntry::new("assets/css/style.aaaa.css", Some("aaaa".into()), "sass"),
        );
        m.insert(
            "logo.png",
            ManifestEntry::new("assets/img/logo.bbbb.png", Some("bbbb".into()), "images"),
        );
        m.insert(
            "assets/fonts/inter.woff2",
            ManifestEntry::new("assets/fonts/inter.cccc.woff2", Some("cccc".into()), "fonts"),
        );
        m
    }

    #[test]
    fn rewrites_double_quoted_href() {
        let out = rewrite_references(r#"<link rel="stylesheet" href="style.scss">"#, &manifest(), "/");
        assert_eq!(
            out,
            r#"<link rel="stylesheet" href="/assets/css/style.aaaa.css">"#
        );
    }

    #[test]
    fn rewrites_single_quoted_src_with_dot_slash() {
        let out = rewrite_references("<img src='./logo.png'>", &manifest(), "/");
        assert_eq!(out, "<img src='/assets/img/logo.bbbb.png'>");
    }

    #[test]
    fn rewrites_root_relative_nested_path() {
        let out = rewrite_references(
            r#"<link href="/assets/fonts/inter.woff2" as="font">"#,
            &manifest(),
            "/",
        );
        assert_eq!(
            out,
            r#"<link href="/assets/fonts/inter.cccc.woff2" as="font">"#
        );
    }

    #[test]
    fn keeps_query_and_fragment() {
        let out = rewrite_references(r#"<img src="logo.png?v=1#top">"#, &manifest(), "/");
        assert_eq!(out, r#"<img src="/assets/img/logo.bbbb.png?v=1#top">"#);
    }

    #[test]
    fn leaves_unknown_and_external_references() {
        let html = r#"<a href="https://example.com/logo.png"></a><script src="missing.js"></script><img src="//cdn/logo.png">"#;
        assert_eq!(rewrite_references(html, &manifest(), "/"), html);
    }

    #[test]
    fn attribute_names_are_case_insensitive_and_spacing_kept() {
        let out = rewrite_references(r#"<IMG SRC = "logo.png">"#, &manifest(), "/");
        assert_eq!(out, r#"<IMG SRC = "/assets/img/logo.bbbb.png">"#);
    }

    #[test]
    fn data_src_attributes_are_rewritten_too() {
        let html = r#"<div data-src="logo.png"></div>"#;
        // `-` is a word boundary, so lazy-loading attributes resolve as well.
        let out = rewrite_references(html, &manifest(), "/");
        assert_eq!(out, r#"<div data-src="/assets/img/logo.bbbb.png"></div>"#);
    }

    #[test]
    fn public_path_joining() {
        assert_eq!(public_url("/", "a.css"), "/a.css");
        assert_eq!(public_url("", "a.css"), "a.css");
        assert_eq!(public_url("https://cdn.example/site", "a.css"), "https://cdn.example/site/a.css");
    }

    #[test]
    fn relative_public_path() {
        let out = rewrite_references(r#"<img src="logo.png">"#, &manifest(), "");
        assert_eq!(out, r#"<img src="assets/img/logo.bbbb.png">"#);
    }
}
