//! Configuration management for pageforge
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. Supports TOML configuration files with `[llm]`,
//! `[retry]`, `[stages.*]`, `[repair]`, and `[output]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use discovery::CONFIG_DIR;
pub use model::*;
pub use pageforge_utils::types::ConfigSource;

use pageforge_utils::types::StageId;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// The configured provider name, defaulting to `ollama`.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// The configured model, defaulting to `qwen3-coder`.
    #[must_use]
    pub fn model(&self) -> &str {
        self.llm.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Per-stage override section, if one was configured.
    #[must_use]
    pub fn stage_config(&self, stage: StageId) -> Option<&StageConfig> {
        match stage {
            StageId::Plan => self.stages.plan.as_ref(),
            StageId::Part => self.stages.part.as_ref(),
            StageId::Validate => self.stages.validate.as_ref(),
            StageId::Repair => self.stages.repair.as_ref(),
        }
    }

    /// Run-wide retry settings (`[retry]`, or the built-in defaults),
    /// ignoring per-stage overrides.
    #[must_use]
    pub fn retry_settings(&self) -> RetrySettings {
        RetrySettings {
            max_attempts: self.retry.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            timeout: Duration::from_secs(self.retry.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            backoff: self
                .retry
                .backoff
                .as_deref()
                .and_then(BackoffKind::parse)
                .unwrap_or_default(),
        }
    }

    /// Resolve retry settings for a stage.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI retry flags (discovery drops stage values they replace)
    /// 2. Stage-specific override (`[stages.<stage>]`)
    /// 3. Run-wide settings (`[retry]`)
    /// 4. Hard defaults: 5 attempts, 180 seconds, exponential backoff
    #[must_use]
    pub fn retry_settings_for(&self, stage: StageId) -> RetrySettings {
        let run_wide = self.retry_settings();
        let Some(stage_config) = self.stage_config(stage) else {
            return run_wide;
        };

        RetrySettings {
            max_attempts: stage_config.max_attempts.unwrap_or(run_wide.max_attempts),
            timeout: stage_config
                .timeout_secs
                .map_or(run_wide.timeout, Duration::from_secs),
            backoff: run_wide.backoff,
        }
    }

    /// Sampling temperature for a stage.
    ///
    /// The plan stage defaults to 0.7; other stages leave the backend default
    /// in place unless overridden.
    #[must_use]
    pub fn temperature_for(&self, stage: StageId) -> Option<f32> {
        self.stage_config(stage)
            .and_then(|s| s.temperature)
            .or(match stage {
                StageId::Plan => Some(DEFAULT_PLAN_TEMPERATURE),
                _ => None,
            })
    }

    /// Maximum number of repairs per run (default 1).
    #[must_use]
    pub fn max_repair_rounds(&self) -> u32 {
        self.repair.max_rounds.unwrap_or(1)
    }

    /// Whether a repaired artifact is validated again (default false).
    #[must_use]
    pub fn revalidate(&self) -> bool {
        self.repair.revalidate.unwrap_or(false)
    }

    #[must_use]
    pub fn output_path(&self) -> &Path {
        self.output
            .path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_PATH))
    }

    /// Where an effective value came from, for status display.
    #[must_use]
    pub fn source_of(&self, key: &str) -> Option<&ConfigSource> {
        self.source_attribution.get(key)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Config {
    /// Create a minimal Config for testing purposes.
    ///
    /// Uses built-in defaults everywhere and touches neither the environment
    /// nor the filesystem.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Config {
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            stages: StagesConfig::default(),
            repair: RepairConfig::default(),
            output: OutputConfig::default(),
            source_attribution: std::collections::HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageforge_utils::error::{ConfigError, ForgeError};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let config_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn isolated_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        // Stop upward discovery at the temp dir.
        fs::create_dir(dir.path().join(".git")).unwrap();
        dir
    }

    #[test]
    fn test_defaults_without_config_file() {
        let dir = isolated_dir();
        let config = Config::discover_from(dir.path(), &CliArgs::default()).unwrap();

        assert_eq!(config.provider(), "ollama");
        assert_eq!(config.model(), "qwen3-coder");
        assert_eq!(config.max_repair_rounds(), 1);
        assert!(!config.revalidate());
        assert_eq!(config.output_path(), Path::new("generated_page.html"));
        assert_eq!(
            config.retry_settings_for(StageId::Part),
            RetrySettings::default()
        );
        assert_eq!(config.source_of("llm_model"), Some(&ConfigSource::Defaults));
    }

    #[test]
    fn test_file_values_are_loaded_and_attributed() {
        let dir = isolated_dir();
        let path = write_config(
            dir.path(),
            r#"
[llm]
provider = "anthropic"
model = "claude-sonnet"

[retry]
max_attempts = 3
timeout_secs = 60
backoff = "none"

[repair]
max_rounds = 2
revalidate = true
"#,
        );

        let config = Config::discover_from(dir.path(), &CliArgs::default()).unwrap();

        assert_eq!(config.provider(), "anthropic");
        assert_eq!(config.model(), "claude-sonnet");
        let settings = config.retry_settings_for(StageId::Validate);
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.timeout, Duration::from_secs(60));
        assert_eq!(settings.backoff, BackoffKind::None);
        assert_eq!(config.max_repair_rounds(), 2);
        assert!(config.revalidate());
        assert_eq!(
            config.source_of("llm_model"),
            Some(&ConfigSource::ConfigFile(path))
        );
    }

    #[test]
    fn test_discovery_walks_upward_from_nested_directory() {
        let dir = isolated_dir();
        write_config(dir.path(), "[llm]\nmodel = \"from-parent\"\n");
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let found = Config::discover_config_file_from(&nested);
        assert!(found.is_some());

        let config = Config::discover_from(&nested, &CliArgs::default()).unwrap();
        assert_eq!(config.model(), "from-parent");
    }

    #[test]
    fn test_discovery_stops_at_repository_root() {
        let outer = TempDir::new().unwrap();
        write_config(outer.path(), "[llm]\nmodel = \"outside\"\n");
        let repo = outer.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert_eq!(Config::discover_config_file_from(&repo), None);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = isolated_dir();
        write_config(
            dir.path(),
            "[llm]\nmodel = \"file-model\"\n[retry]\nmax_attempts = 4\n",
        );
        let cli_args = CliArgs {
            model: Some("cli-model".to_string()),
            max_attempts: Some(2),
            revalidate: Some(true),
            ..CliArgs::default()
        };

        let config = Config::discover_from(dir.path(), &cli_args).unwrap();

        assert_eq!(config.model(), "cli-model");
        assert_eq!(config.retry_settings_for(StageId::Plan).max_attempts, 2);
        assert!(config.revalidate());
        assert_eq!(config.source_of("llm_model"), Some(&ConfigSource::Cli));
    }

    #[test]
    fn test_stage_override_beats_run_wide_retry() {
        let dir = isolated_dir();
        write_config(
            dir.path(),
            r#"
[retry]
max_attempts = 4
timeout_secs = 90

[stages.validate]
max_attempts = 1
temperature = 0.0
"#,
        );

        let config = Config::discover_from(dir.path(), &CliArgs::default()).unwrap();

        let validate = config.retry_settings_for(StageId::Validate);
        assert_eq!(validate.max_attempts, 1);
        assert_eq!(validate.timeout, Duration::from_secs(90));
        assert_eq!(config.retry_settings_for(StageId::Part).max_attempts, 4);
        assert_eq!(config.temperature_for(StageId::Validate), Some(0.0));
    }

    #[test]
    fn test_cli_retry_flags_beat_file_stage_overrides() {
        let dir = isolated_dir();
        write_config(
            dir.path(),
            r#"
[stages.plan]
max_attempts = 3
timeout_secs = 120
temperature = 0.2
"#,
        );
        let cli_args = CliArgs {
            max_attempts: Some(1),
            timeout_secs: Some(10),
            ..CliArgs::default()
        };

        let config = Config::discover_from(dir.path(), &cli_args).unwrap();

        for stage in StageId::ALL {
            let settings = config.retry_settings_for(stage);
            assert_eq!(settings.max_attempts, 1, "{stage:?}");
            assert_eq!(settings.timeout, Duration::from_secs(10), "{stage:?}");
        }
        assert_eq!(config.retry_settings(), config.retry_settings_for(StageId::Plan));
        assert_eq!(config.source_of("max_attempts"), Some(&ConfigSource::Cli));
        assert_eq!(config.source_of("timeout_secs"), Some(&ConfigSource::Cli));
        // Only the overridden keys are dropped from the stage section.
        assert_eq!(config.temperature_for(StageId::Plan), Some(0.2));
    }

    #[test]
    fn test_plan_temperature_defaults_to_point_seven() {
        let config = Config::minimal_for_testing();
        assert_eq!(config.temperature_for(StageId::Plan), Some(0.7));
        assert_eq!(config.temperature_for(StageId::Part), None);
    }

    #[test]
    fn test_explicit_missing_config_path_is_not_found() {
        let dir = isolated_dir();
        let cli_args = CliArgs {
            config_path: Some(dir.path().join("missing.toml")),
            ..CliArgs::default()
        };

        let err = Config::discover_from(dir.path(), &cli_args).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Config(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_toml_is_invalid_file() {
        let dir = isolated_dir();
        write_config(dir.path(), "[llm\nmodel = ");

        let err = Config::discover_from(dir.path(), &CliArgs::default()).unwrap_err();
        assert!(matches!(err, ForgeError::Config(ConfigError::InvalidFile(_))));
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let dir = isolated_dir();
        write_config(dir.path(), "[defaults]\nmodel = \"x\"\n");

        let err = Config::discover_from(dir.path(), &CliArgs::default()).unwrap_err();
        assert!(matches!(err, ForgeError::Config(ConfigError::InvalidFile(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let cases = [
            "[llm]\nprovider = \"openai\"\n",
            "[retry]\nmax_attempts = 0\n",
            "[retry]\ntimeout_secs = 0\n",
            "[retry]\nbackoff = \"linear\"\n",
            "[repair]\nmax_rounds = 0\n",
            "[stages.plan]\ntemperature = 3.5\n",
            "[stages.part]\nmax_attempts = 0\n",
        ];

        for content in cases {
            let dir = isolated_dir();
            write_config(dir.path(), content);
            let err = Config::discover_from(dir.path(), &CliArgs::default()).unwrap_err();
            assert!(
                matches!(err, ForgeError::Config(ConfigError::InvalidValue { .. })),
                "expected InvalidValue for {content:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_builder_is_programmatic_and_validated() {
        let config = Config::builder()
            .model("tiny")
            .timeout(Duration::from_millis(1500))
            .backoff(BackoffKind::None)
            .stage(
                StageId::Repair,
                StageConfig {
                    max_attempts: Some(2),
                    ..StageConfig::default()
                },
            )
            .build()
            .unwrap();

        assert_eq!(config.model(), "tiny");
        assert_eq!(config.source_of("llm_model"), Some(&ConfigSource::Programmatic));
        assert_eq!(config.source_of("max_attempts"), Some(&ConfigSource::Defaults));
        let repair = config.retry_settings_for(StageId::Repair);
        assert_eq!(repair.max_attempts, 2);
        assert_eq!(repair.timeout, Duration::from_secs(2));
        assert_eq!(repair.backoff, BackoffKind::None);

        assert!(Config::builder().max_attempts(0).build().is_err());
        assert!(Config::builder().provider("nope").build().is_err());
    }
}
