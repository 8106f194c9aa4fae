//! Shared identifier types used across pageforge crates

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifies a stage of a generation run that talks to the generation service.
///
/// `StageId` is the key used for per-stage configuration overrides
/// (`[stages.<stage>]`), log fields, and operation labels on retry failures.
///
/// # Serialization
///
/// `StageId` serializes to its lowercase name (e.g., `"plan"`, `"validate"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageId {
    /// Structural plan synthesis.
    Plan,
    /// Generation of one plan section.
    Part,
    /// Review of the combined artifact.
    Validate,
    /// Rewrite of an artifact the validator rejected.
    Repair,
}

impl StageId {
    /// All stages, in the order a run first reaches them.
    pub const ALL: [StageId; 4] = [Self::Plan, Self::Part, Self::Validate, Self::Repair];

    /// Returns the canonical lowercase name of the stage.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pageforge_utils::types::StageId;
    ///
    /// assert_eq!(StageId::Plan.as_str(), "plan");
    /// assert_eq!(StageId::Repair.as_str(), "repair");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Part => "part",
            Self::Validate => "validate",
            Self::Repair => "repair",
        }
    }

    /// Parse a stage name as written in configuration files.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an effective configuration value came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from the configuration file at this path.
    ConfigFile(PathBuf),
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::ConfigFile(path) => write!(f, "config ({})", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Defaults => write!(f, "default"),
        }
    }
}
