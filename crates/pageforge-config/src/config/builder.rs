use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use pageforge_utils::error::ForgeError;
use pageforge_utils::types::StageId;

use super::{
    BackoffKind, Config, ConfigSource, LlmConfig, OutputConfig, RepairConfig, RetryConfig,
    StageConfig, StagesConfig,
};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// ```rust
    /// use pageforge_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .provider("ollama")
    ///     .model("qwen3-coder")
    ///     .max_attempts(3)
    ///     .timeout(Duration::from_secs(60))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.model(), "qwen3-coder");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// Never reads the environment or the filesystem. All values set via the
/// builder are attributed to `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    provider: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    api_key_env: Option<String>,
    max_attempts: Option<u32>,
    timeout: Option<Duration>,
    backoff: Option<BackoffKind>,
    stages: StagesConfig,
    max_repair_rounds: Option<u32>,
    revalidate: Option<bool>,
    output_path: Option<PathBuf>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    /// Set the run-wide number of attempts per resilient invocation.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the run-wide per-attempt timeout. Sub-second parts are rounded up.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn backoff(mut self, backoff: BackoffKind) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Override settings for a single stage.
    #[must_use]
    pub fn stage(mut self, stage: StageId, config: StageConfig) -> Self {
        let slot = match stage {
            StageId::Plan => &mut self.stages.plan,
            StageId::Part => &mut self.stages.part,
            StageId::Validate => &mut self.stages.validate,
            StageId::Repair => &mut self.stages.repair,
        };
        *slot = Some(config);
        self
    }

    #[must_use]
    pub fn max_repair_rounds(mut self, rounds: u32) -> Self {
        self.max_repair_rounds = Some(rounds);
        self
    }

    #[must_use]
    pub fn revalidate(mut self, revalidate: bool) -> Self {
        self.revalidate = Some(revalidate);
        self
    }

    #[must_use]
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Build the configuration, validating every value.
    pub fn build(self) -> Result<Config, ForgeError> {
        let mut source_attribution = HashMap::new();
        let mut mark = |key: &str, set: bool| {
            let source = if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Defaults
            };
            source_attribution.insert(key.to_string(), source);
        };

        mark("llm_provider", self.provider.is_some());
        mark("llm_model", self.model.is_some());
        mark("max_attempts", self.max_attempts.is_some());
        mark("timeout_secs", self.timeout.is_some());
        mark("backoff", self.backoff.is_some());
        mark("repair_max_rounds", self.max_repair_rounds.is_some());
        mark("repair_revalidate", self.revalidate.is_some());
        mark("output_path", self.output_path.is_some());

        let timeout_secs = self.timeout.map(|t| {
            let secs = t.as_secs();
            if t.subsec_nanos() > 0 { secs + 1 } else { secs }
        });

        let config = Config {
            llm: LlmConfig {
                provider: self.provider,
                model: self.model,
                base_url: self.base_url,
                api_key_env: self.api_key_env,
                max_tokens: None,
            },
            retry: RetryConfig {
                max_attempts: self.max_attempts,
                timeout_secs,
                backoff: self.backoff.map(|b| b.as_str().to_string()),
            },
            stages: self.stages,
            repair: RepairConfig {
                max_rounds: self.max_repair_rounds,
                revalidate: self.revalidate,
            },
            output: OutputConfig {
                path: self.output_path,
            },
            source_attribution,
        };

        config.validate()?;
        Ok(config)
    }
}
