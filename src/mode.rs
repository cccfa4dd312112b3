//! Build mode selection.
//!
//! A run is either a fast development build (plain file names, no
//! optimization transforms) or a production build (content-hashed file names,
//! optimization transforms enabled). The mode is picked once at startup and
//! handed to [`Pipeline::new`](crate::pipeline::Pipeline::new); nothing below
//! the CLI reads it from the environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable consulted by the CLI when `--mode` is not given.
pub const MODE_ENV_VAR: &str = "BUILD_MODE";

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown build mode '{0}' (expected development or production)")]
pub struct UnknownMode(pub String);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    #[value(alias = "dev")]
    Development,
    #[value(alias = "prod")]
    Production,
}

impl BuildMode {
    pub fn is_production(self) -> bool {
        self == BuildMode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_development() {
        assert_eq!(BuildMode::default(), BuildMode::Development);
    }

    #[test]
    fn parse_full_names() {
        assert_eq!("development".parse(), Ok(BuildMode::Development));
        assert_eq!("production".parse(), Ok(BuildMode::Production));
    }

    #[test]
    fn parse_aliases_and_case() {
        assert_eq!("dev".parse(), Ok(BuildMode::Development));
        assert_eq!(" PROD ".parse(), Ok(BuildMode::Production));
    }

    #[test]
    fn parse_unknown_is_error() {
        let err = "staging".parse::<BuildMode>().unwrap_err();
        assert_eq!(err, UnknownMode("staging".into()));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&BuildMode::Production).unwrap();
        assert_eq!(json, "\"production\"");
    }

    #[test]
    fn display_matches_serialized_name() {
        assert_eq!(BuildMode::Development.to_string(), "development");
        assert!(BuildMode::Production.is_production());
        assert!(!BuildMode::Development.is_production());
    }
}
