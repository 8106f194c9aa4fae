use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pageforge_utils::error::{ConfigError, ForgeError};

use super::{
    CliArgs, Config, ConfigSource, LlmConfig, OutputConfig, RepairConfig, RetryConfig,
    StagesConfig,
};

/// Directory searched for during discovery.
pub const CONFIG_DIR: &str = ".pageforge";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    llm: Option<LlmConfig>,
    retry: Option<RetryConfig>,
    stages: Option<StagesConfig>,
    repair: Option<RepairConfig>,
    output: Option<OutputConfig>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ForgeError> {
        let start_dir = std::env::current_dir().map_err(|e| {
            ForgeError::Config(ConfigError::DiscoveryFailed {
                reason: format!("cannot determine current directory: {e}"),
            })
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory.
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, ForgeError> {
        let mut source_attribution = HashMap::new();

        let mut llm = LlmConfig::default();
        let mut retry = RetryConfig::default();
        let mut stages = StagesConfig::default();
        let mut repair = RepairConfig::default();
        let mut output = OutputConfig::default();

        for key in [
            "llm_provider",
            "llm_model",
            "max_attempts",
            "timeout_secs",
            "backoff",
            "repair_max_rounds",
            "repair_revalidate",
            "output_path",
        ] {
            source_attribution.insert(key.to_string(), ConfigSource::Defaults);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit_path) => {
                if !explicit_path.exists() {
                    return Err(ForgeError::Config(ConfigError::NotFound {
                        path: explicit_path.display().to_string(),
                    }));
                }
                Some(explicit_path.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path).map_err(|e| {
                ForgeError::Config(ConfigError::InvalidFile(format!("{e:#}")))
            })?;
            let config_source = ConfigSource::ConfigFile(path.clone());

            if let Some(file_llm) = file_config.llm {
                if file_llm.provider.is_some() {
                    llm.provider = file_llm.provider;
                    source_attribution.insert("llm_provider".to_string(), config_source.clone());
                }
                if file_llm.model.is_some() {
                    llm.model = file_llm.model;
                    source_attribution.insert("llm_model".to_string(), config_source.clone());
                }
                if file_llm.base_url.is_some() {
                    llm.base_url = file_llm.base_url;
                    source_attribution.insert("llm_base_url".to_string(), config_source.clone());
                }
                if file_llm.api_key_env.is_some() {
                    llm.api_key_env = file_llm.api_key_env;
                    source_attribution
                        .insert("llm_api_key_env".to_string(), config_source.clone());
                }
                if file_llm.max_tokens.is_some() {
                    llm.max_tokens = file_llm.max_tokens;
                    source_attribution
                        .insert("llm_max_tokens".to_string(), config_source.clone());
                }
            }

            if let Some(file_retry) = file_config.retry {
                if file_retry.max_attempts.is_some() {
                    retry.max_attempts = file_retry.max_attempts;
                    source_attribution.insert("max_attempts".to_string(), config_source.clone());
                }
                if file_retry.timeout_secs.is_some() {
                    retry.timeout_secs = file_retry.timeout_secs;
                    source_attribution.insert("timeout_secs".to_string(), config_source.clone());
                }
                if file_retry.backoff.is_some() {
                    retry.backoff = file_retry.backoff;
                    source_attribution.insert("backoff".to_string(), config_source.clone());
                }
            }

            if let Some(file_stages) = file_config.stages {
                stages = file_stages;
                source_attribution.insert("stages".to_string(), config_source.clone());
            }

            if let Some(file_repair) = file_config.repair {
                if file_repair.max_rounds.is_some() {
                    repair.max_rounds = file_repair.max_rounds;
                    source_attribution
                        .insert("repair_max_rounds".to_string(), config_source.clone());
                }
                if file_repair.revalidate.is_some() {
                    repair.revalidate = file_repair.revalidate;
                    source_attribution
                        .insert("repair_revalidate".to_string(), config_source.clone());
                }
            }

            if let Some(file_output) = file_config.output
                && file_output.path.is_some()
            {
                output.path = file_output.path;
                source_attribution.insert("output_path".to_string(), config_source.clone());
            }
        }

        // CLI overrides
        if let Some(provider) = &cli_args.llm_provider {
            llm.provider = Some(provider.clone());
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Cli);
        }
        if let Some(model) = &cli_args.model {
            llm.model = Some(model.clone());
            source_attribution.insert("llm_model".to_string(), ConfigSource::Cli);
        }
        // A retry flag applies to every stage, so it also replaces the
        // file's per-stage values for the same key.
        if let Some(max_attempts) = cli_args.max_attempts {
            retry.max_attempts = Some(max_attempts);
            stages.iter_mut().for_each(|s| s.max_attempts = None);
            source_attribution.insert("max_attempts".to_string(), ConfigSource::Cli);
        }
        if let Some(timeout_secs) = cli_args.timeout_secs {
            retry.timeout_secs = Some(timeout_secs);
            stages.iter_mut().for_each(|s| s.timeout_secs = None);
            source_attribution.insert("timeout_secs".to_string(), ConfigSource::Cli);
        }
        if let Some(max_repairs) = cli_args.max_repairs {
            repair.max_rounds = Some(max_repairs);
            source_attribution.insert("repair_max_rounds".to_string(), ConfigSource::Cli);
        }
        if let Some(revalidate) = cli_args.revalidate {
            repair.revalidate = Some(revalidate);
            source_attribution.insert("repair_revalidate".to_string(), ConfigSource::Cli);
        }
        if let Some(path) = &cli_args.output_path {
            output.path = Some(path.clone());
            source_attribution.insert("output_path".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            llm,
            retry,
            stages,
            repair,
            output,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover config file by searching upward from a given directory.
    ///
    /// Walks up the directory tree looking for `.pageforge/config.toml`, stopping
    /// at a repository root (`.git`) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = start_dir;

        loop {
            let config_path = current_dir.join(CONFIG_DIR).join("config.toml");
            if config_path.is_file() {
                return Some(config_path);
            }

            if current_dir.join(".git").exists() {
                return None;
            }

            current_dir = current_dir.parent()?;
        }
    }

    fn load_config_file(path: &Path) -> anyhow::Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;
        Ok(config)
    }
}
