//! # Simple Bundle
//!
//! A small asset-pipeline orchestrator for static sites. Point it at a source
//! directory of HTML templates, stylesheets, scripts, and images; it decides
//! what to do with each file from a declarative rule table, runs the matched
//! transform chain, writes the results, and records every output in a JSON
//! manifest.
//!
//! # Architecture
//!
//! ```text
//! 1. Discover   src/     →  entry templates + assets
//! 2. Resolve    asset    →  first matching rule (or pass-through)
//! 3. Transform  bytes    →  chain output via a TransformBackend
//! 4. Name       output   →  style.css (development) / style.<hash>.css (production)
//! 5. Write      dist/    +  manifest.json
//! ```
//!
//! Entry templates are processed last so their `src`/`href` references can be
//! rewritten to the final output paths.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestration: plan, run, per-asset failure collection |
//! | [`scan`] | Entry point discovery and asset collection (top level + copy patterns) |
//! | [`rules`] | Rule table compilation and first-match resolution |
//! | [`transform`] | Typed transform specs, the backend trait, the built-in backend |
//! | [`generate`] | Asset reference rewriting in HTML templates |
//! | [`naming`] | Plain vs content-hashed output file names |
//! | [`config`] | `bundle.toml` loading, merging over stock defaults, validation |
//! | [`mode`] | Development / production build mode |
//! | [`types`] | The output manifest |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## First Match Wins
//!
//! Rules are tried in the order they are declared and the first pattern that
//! matches decides the chain. There is no specificity scoring: a catch-all
//! declared early shadows everything after it. Files no rule matches are
//! copied through unchanged and recorded with the `passthrough` rule.
//!
//! ## Hash the Output, Not the Input
//!
//! Production file names embed the SHA-256 of the bytes actually written. Two
//! sources that compile to the same output share a hash, and a change to a
//! transform's behaviour changes the name even when the source did not.
//!
//! ## Failures Stay Local
//!
//! One broken stylesheet should not hide every other problem in a build. Each
//! asset either lands in the manifest or in [`pipeline::BuildOutcome::failures`];
//! only problems that make the whole run meaningless abort it.

pub mod config;
pub mod generate;
pub mod mode;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod scan;
pub mod transform;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
