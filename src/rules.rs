//! Transform table construction and rule resolution.
//!
//! A [`TransformTable`] is an ordered list of [`TransformRule`]s compiled from
//! [`RuleConfig`]s. Resolution walks the table in definition order and the
//! first rule whose pattern matches wins; order is never reconsidered.
//!
//! Patterns test the asset's logical name (its `/`-separated path relative to
//! the source root):
//!
//! - `extensions = ["scss", "sass"]`: case-insensitive match on the last extension
//! - `regex = '\.s[ac]ss$'`: [`regex::Regex::is_match`] on the whole logical name

use crate::config::{ConfigError, RuleConfig};
use crate::mode::BuildMode;
use crate::naming::split_file_name;
use crate::transform::TransformSpec;
use regex::Regex;
use std::collections::HashSet;

/// Rule name recorded for files that match no rule.
pub const PASSTHROUGH_RULE: &str = "passthrough";

#[derive(Debug, Clone)]
pub enum Pattern {
    Extensions(Vec<String>),
    Regex(Regex),
}

impl Pattern {
    pub fn matches(&self, logical_name: &str) -> bool {
        match self {
            Pattern::Extensions(exts) => {
                let (_, ext) = split_file_name(logical_name);
                !ext.is_empty() && exts.iter().any(|e| e.eq_ignore_ascii_case(ext))
            }
            Pattern::Regex(re) => re.is_match(logical_name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformRule {
    pub name: String,
    pub pattern: Pattern,
    /// Destination subdirectory, normalized to end with `/` (or empty).
    pub output_dir: String,
    pub chain: Vec<TransformSpec>,
}

impl TransformRule {
    /// The chain steps that run in `mode`, in order.
    pub fn chain_for(&self, mode: BuildMode) -> impl Iterator<Item = &TransformSpec> {
        self.chain.iter().filter(move |s| s.applies_in(mode))
    }
}

#[derive(Debug, Clone)]
pub struct TransformTable {
    rules: Vec<TransformRule>,
}

impl TransformTable {
    /// First rule, in definition order, whose pattern matches.
    pub fn resolve(&self, logical_name: &str) -> Option<&TransformRule> {
        self.rules.iter().find(|r| r.pattern.matches(logical_name))
    }

    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Compile rule configs into a table. No I/O.
///
/// Fails on an empty table, duplicate rule names, a rule with both or
/// neither of `extensions`/`regex`, an invalid regex, an empty chain, or an
/// `optimize_image` quality outside 1-100.
pub fn build_transform_table(configs: &[RuleConfig]) -> Result<TransformTable, ConfigError> {
    if configs.is_empty() {
        return Err(ConfigError::Validation(
            "rule table must contain at least one rule".into(),
        ));
    }

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(configs.len());

    for config in configs {
        if config.name.is_empty() {
            return Err(ConfigError::Validation("rule name must not be empty".into()));
        }
        if !seen.insert(config.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate rule name '{}'",
                config.name
            )));
        }
        if config.chain.is_empty() {
            return Err(ConfigError::Validation(format!(
                "rule '{}' has an empty transform chain",
                config.name
            )));
        }

        for spec in &config.chain {
            if let TransformSpec::OptimizeImage(opts) = spec
                && !(1..=100).contains(&opts.quality)
            {
                return Err(ConfigError::Validation(format!(
                    "rule '{}': optimize_image quality {} is outside 1-100",
                    config.name, opts.quality
                )));
            }
        }

        let pattern = match (&config.regex, config.extensions.is_empty()) {
            (Some(_), false) | (None, true) => {
                return Err(ConfigError::Validation(format!(
                    "rule '{}' must set exactly one of `extensions` or `regex`",
                    config.name
                )));
            }
            (Some(re), true) => {
                Pattern::Regex(Regex::new(re).map_err(|source| ConfigError::Pattern {
                    rule: config.name.clone(),
                    source,
                })?)
            }
            (None, false) => {
                let exts: Vec<String> = config
                    .extensions
                    .iter()
                    .map(|e| e.trim_start_matches('.').to_string())
                    .collect();
                if exts.iter().any(|e| e.is_empty()) {
                    return Err(ConfigError::Validation(format!(
                        "rule '{}' has an empty extension",
                        config.name
                    )));
                }
                Pattern::Extensions(exts)
            }
        };

        rules.push(TransformRule {
            name: config.name.clone(),
            pattern,
            output_dir: normalize_dir(&config.output_dir),
            chain: config.chain.clone(),
        });
    }

    Ok(TransformTable { rules })
}

/// `"assets/css"` → `"assets/css/"`, `"./"` → `""`.
pub(crate) fn normalize_dir(dir: &str) -> String {
    let trimmed = dir.trim_start_matches("./").trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::stock_rules;
    use crate::transform::{MinifyOptions, MinifySyntax, OptimizeOptions, StylesheetOptions};

    fn rule(name: &str, exts: &[&str], regex: Option<&str>, chain: Vec<TransformSpec>) -> RuleConfig {
        RuleConfig {
            name: name.into(),
            extensions: exts.iter().map(|e| e.to_string()).collect(),
            regex: regex.map(String::from),
            output_dir: String::new(),
            chain,
        }
    }

    fn stock_table() -> TransformTable {
        build_transform_table(&stock_rules()).unwrap()
    }

    #[test]
    fn stock_table_builds() {
        assert_eq!(stock_table().len(), 8);
    }

    #[test]
    fn stock_table_resolves_common_assets() {
        let table = stock_table();
        let name = |f: &str| table.resolve(f).map(|r| r.name.as_str());

        assert_eq!(name("index.html"), Some("template"));
        assert_eq!(name("style.css"), Some("styles"));
        assert_eq!(name("style.scss"), Some("sass"));
        assert_eq!(name("theme.sass"), Some("sass"));
        assert_eq!(name("logo.png"), Some("images"));
        assert_eq!(name("PHOTO.JPG"), Some("images"));
        assert_eq!(name("assets/fonts/inter.woff2"), Some("fonts"));
        assert_eq!(name("feed.xml"), Some("xml"));
        assert_eq!(name("data.csv"), Some("csv"));
        assert_eq!(name("app.js"), Some("scripts"));
        assert_eq!(name("README"), None);
        assert_eq!(name("notes.txt"), None);
    }

    #[test]
    fn first_matching_rule_wins() {
        // Both rules match `style.css`; the first declared one must win.
        let table = build_transform_table(&[
            rule("any-css", &[], Some(r"\.css$"), vec![TransformSpec::Copy]),
            rule(
                "stylesheets",
                &["css"],
                None,
                vec![TransformSpec::Stylesheet(StylesheetOptions::default())],
            ),
        ])
        .unwrap();

        let resolved = table.resolve("style.css").unwrap();
        assert_eq!(resolved.name, "any-css");
        assert_eq!(resolved.chain, vec![TransformSpec::Copy]);
    }

    #[test]
    fn tie_break_follows_declaration_order_not_specificity() {
        let table = build_transform_table(&[
            rule("catch-all", &[], Some("."), vec![TransformSpec::Copy]),
            rule("scripts", &["js"], None, vec![TransformSpec::Copy]),
        ])
        .unwrap();
        assert_eq!(table.resolve("app.js").unwrap().name, "catch-all");
    }

    #[test]
    fn extension_match_is_case_insensitive_and_dot_tolerant() {
        let table =
            build_transform_table(&[rule("img", &[".PNG"], None, vec![TransformSpec::Copy])])
                .unwrap();
        assert!(table.resolve("logo.png").is_some());
        assert!(table.resolve("logo.Png").is_some());
        assert!(table.resolve("png").is_none());
    }

    #[test]
    fn chain_for_filters_optimizations_in_development() {
        let table = build_transform_table(&[rule(
            "css",
            &["css"],
            None,
            vec![
                TransformSpec::Stylesheet(StylesheetOptions::default()),
                TransformSpec::Minify(MinifyOptions {
                    syntax: MinifySyntax::Css,
                }),
            ],
        )])
        .unwrap();
        let r = &table.rules()[0];

        let dev: Vec<&str> = r.chain_for(BuildMode::Development).map(|s| s.kind()).collect();
        let prod: Vec<&str> = r.chain_for(BuildMode::Production).map(|s| s.kind()).collect();
        assert_eq!(dev, vec!["stylesheet"]);
        assert_eq!(prod, vec!["stylesheet", "minify"]);
    }

    #[test]
    fn empty_table_rejected() {
        assert!(matches!(
            build_transform_table(&[]),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn invalid_regex_rejected() {
        let result =
            build_transform_table(&[rule("bad", &[], Some("(unclosed"), vec![TransformSpec::Copy])]);
        assert!(matches!(result, Err(ConfigError::Pattern { rule, .. }) if rule == "bad"));
    }

    #[test]
    fn both_or_neither_pattern_rejected() {
        let both = build_transform_table(&[rule(
            "both",
            &["css"],
            Some(r"\.css$"),
            vec![TransformSpec::Copy],
        )]);
        assert!(matches!(both, Err(ConfigError::Validation(_))));

        let neither = build_transform_table(&[rule("neither", &[], None, vec![TransformSpec::Copy])]);
        assert!(matches!(neither, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_chain_rejected() {
        let result = build_transform_table(&[rule("empty", &["css"], None, vec![])]);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn optimize_quality_out_of_range_rejected() {
        for quality in [0, 101] {
            let chain = vec![TransformSpec::OptimizeImage(OptimizeOptions { quality })];
            let result = build_transform_table(&[rule("images", &["png"], None, chain)]);
            match result {
                Err(ConfigError::Validation(msg)) => {
                    assert!(msg.contains("images") && msg.contains("quality"), "{msg}")
                }
                other => panic!("quality {quality} accepted: {other:?}"),
            }
        }

        let chain = vec![TransformSpec::OptimizeImage(OptimizeOptions { quality: 100 })];
        assert!(build_transform_table(&[rule("images", &["png"], None, chain)]).is_ok());
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = build_transform_table(&[
            rule("dup", &["css"], None, vec![TransformSpec::Copy]),
            rule("dup", &["js"], None, vec![TransformSpec::Copy]),
        ]);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn output_dir_normalized() {
        assert_eq!(normalize_dir(""), "");
        assert_eq!(normalize_dir("./"), "");
        assert_eq!(normalize_dir("."), "");
        assert_eq!(normalize_dir("assets/css"), "assets/css/");
        assert_eq!(normalize_dir("assets/css/"), "assets/css/");
        assert_eq!(normalize_dir("./assets/js"), "assets/js/");
    }
}
