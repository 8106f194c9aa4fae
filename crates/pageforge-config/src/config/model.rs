use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use pageforge_utils::types::ConfigSource;

/// Default provider when nothing else is configured.
pub const DEFAULT_PROVIDER: &str = "ollama";

/// Default model served by the local model server.
pub const DEFAULT_MODEL: &str = "qwen3-coder";

/// Default number of attempts per resilient invocation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default per-attempt timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Default sampling temperature for the planning stage.
pub const DEFAULT_PLAN_TEMPERATURE: f32 = 0.7;

/// Default output path for the finished page.
pub const DEFAULT_OUTPUT_PATH: &str = "generated_page.html";

/// Providers the backend factory knows how to construct.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "anthropic"];

/// Backoff schedule between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// `2^a + a*0.5` seconds after failed attempt `a`.
    #[default]
    Exponential,
    /// Retry immediately.
    None,
}

impl BackoffKind {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "exponential" => Some(Self::Exponential),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exponential => "exponential",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for BackoffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for pageforge runs.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > config file > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI-like behavior that searches for
/// `.pageforge/config.toml` upward from the current directory and applies
/// built-in defaults for unspecified values.
///
/// # Source Attribution
///
/// Each configuration value tracks its source (`cli`, `config`, `programmatic`, or `default`).
///
/// # Configuration File Format
///
/// ```toml
/// [llm]
/// provider = "ollama"
/// model = "qwen3-coder"
///
/// [retry]
/// max_attempts = 5
/// timeout_secs = 180
/// backoff = "exponential"
///
/// [stages.plan]
/// temperature = 0.7
///
/// [repair]
/// max_rounds = 1
/// revalidate = false
///
/// [output]
/// path = "generated_page.html"
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Generation service configuration.
    pub llm: LlmConfig,
    /// Run-wide retry defaults.
    pub retry: RetryConfig,
    /// Per-stage overrides.
    pub stages: StagesConfig,
    /// Validate/repair cycle bounds.
    pub repair: RepairConfig,
    /// Where the finished page goes.
    pub output: OutputConfig,
    /// Source attribution for each setting.
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Generation service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Environment variable holding the API key (anthropic only).
    pub api_key_env: Option<String>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub backoff: Option<String>,
}

/// Per-stage configuration overrides
///
/// Values set here override `[retry]` for that specific stage.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
}

/// Stage-specific configuration section
///
/// ```toml
/// [stages.part]
/// timeout_secs = 240
///
/// [stages.validate]
/// max_attempts = 2
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StagesConfig {
    pub plan: Option<StageConfig>,
    pub part: Option<StageConfig>,
    pub validate: Option<StageConfig>,
    pub repair: Option<StageConfig>,
}

impl StagesConfig {
    /// Every configured stage section.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StageConfig> {
        [
            &mut self.plan,
            &mut self.part,
            &mut self.validate,
            &mut self.repair,
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RepairConfig {
    pub max_rounds: Option<u32>,
    pub revalidate: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
}

/// Resolved retry settings for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub timeout: std::time::Duration,
    pub backoff: BackoffKind,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            backoff: BackoffKind::Exponential,
        }
    }
}
