use pageforge_utils::error::{ConfigError, ForgeError};

use super::{BackoffKind, Config, KNOWN_PROVIDERS, StageConfig};

fn invalid(key: &str, value: impl Into<String>) -> ForgeError {
    ForgeError::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    })
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ForgeError> {
        if let Some(provider) = &self.llm.provider
            && !KNOWN_PROVIDERS.contains(&provider.as_str())
        {
            return Err(invalid(
                "llm.provider",
                format!(
                    "unknown provider '{provider}' (expected one of: {})",
                    KNOWN_PROVIDERS.join(", ")
                ),
            ));
        }

        if let Some(model) = &self.llm.model
            && model.trim().is_empty()
        {
            return Err(invalid("llm.model", "must not be empty"));
        }

        if self.llm.max_tokens == Some(0) {
            return Err(invalid("llm.max_tokens", "must be greater than 0"));
        }

        if let Some(backoff) = &self.retry.backoff
            && BackoffKind::parse(backoff).is_none()
        {
            return Err(invalid(
                "retry.backoff",
                format!("unknown backoff '{backoff}' (expected 'exponential' or 'none')"),
            ));
        }

        check_attempts("retry.max_attempts", self.retry.max_attempts)?;
        check_timeout("retry.timeout_secs", self.retry.timeout_secs)?;

        for (name, stage) in [
            ("plan", &self.stages.plan),
            ("part", &self.stages.part),
            ("validate", &self.stages.validate),
            ("repair", &self.stages.repair),
        ] {
            if let Some(stage) = stage {
                validate_stage(name, stage)?;
            }
        }

        if self.repair.max_rounds == Some(0) {
            return Err(invalid("repair.max_rounds", "must be at least 1"));
        }

        if let Some(path) = &self.output.path
            && path.as_os_str().is_empty()
        {
            return Err(invalid("output.path", "must not be empty"));
        }

        Ok(())
    }
}

fn check_attempts(key: &str, value: Option<u32>) -> Result<(), ForgeError> {
    if value == Some(0) {
        return Err(invalid(key, "must be at least 1"));
    }
    Ok(())
}

fn check_timeout(key: &str, value: Option<u64>) -> Result<(), ForgeError> {
    if value == Some(0) {
        return Err(invalid(key, "must be at least 1 second"));
    }
    Ok(())
}

fn validate_stage(name: &str, stage: &StageConfig) -> Result<(), ForgeError> {
    if let Some(temperature) = stage.temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        return Err(invalid(
            &format!("stages.{name}.temperature"),
            format!("{temperature} is outside [0, 2]"),
        ));
    }
    check_attempts(&format!("stages.{name}.max_attempts"), stage.max_attempts)?;
    check_timeout(&format!("stages.{name}.timeout_secs"), stage.timeout_secs)
}
