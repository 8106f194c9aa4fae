//! Per-stage settings and the stage-aware service client

use crate::invoker::{ResilientInvoker, RetryPolicy};
use pageforge_config::{Config, DEFAULT_MODEL, DEFAULT_PLAN_TEMPERATURE};
use pageforge_llm::{LlmInvocation, Message};
use pageforge_utils::error::ForgeError;
use pageforge_utils::types::StageId;
use serde::Serialize;

/// How far the validate/repair cycle may go.
///
/// The default is a single repair with no second validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RepairPolicy {
    max_rounds: u32,
    /// Validate again after each repair.
    pub revalidate: bool,
}

impl RepairPolicy {
    /// A policy allowing at least one repair.
    #[must_use]
    pub fn new(max_rounds: u32, revalidate: bool) -> Self {
        Self {
            max_rounds: max_rounds.max(1),
            revalidate,
        }
    }

    /// Maximum repairs per run. Only reachable above 1 with `revalidate`.
    #[must_use]
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self::new(1, false)
    }
}

/// Retry policy and sampling temperature for one stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageOptions {
    pub policy: RetryPolicy,
    pub temperature: Option<f32>,
}

impl StageOptions {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            temperature: None,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Everything the engine needs from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub model: String,
    stages: [StageOptions; 4],
    pub repair_policy: RepairPolicy,
}

impl EngineSettings {
    /// Resolve per-stage policies from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let stages = StageId::ALL.map(|stage| {
            StageOptions::new(RetryPolicy::from_settings(
                &config.retry_settings_for(stage),
            ))
            .with_temperature(config.temperature_for(stage))
        });

        Self {
            model: config.model().to_string(),
            stages,
            repair_policy: RepairPolicy::new(config.max_repair_rounds(), config.revalidate()),
        }
    }

    #[must_use]
    pub fn stage(&self, stage: StageId) -> &StageOptions {
        &self.stages[slot(stage)]
    }

    #[must_use]
    pub fn with_stage(mut self, stage: StageId, options: StageOptions) -> Self {
        self.stages[slot(stage)] = options;
        self
    }

    /// Replace the retry policy of every stage, keeping temperatures.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        for options in &mut self.stages {
            options.policy = policy;
        }
        self
    }

    #[must_use]
    pub fn with_repair_policy(mut self, repair_policy: RepairPolicy) -> Self {
        self.repair_policy = repair_policy;
        self
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        let stages = StageId::ALL.map(|stage| {
            let temperature = (stage == StageId::Plan).then_some(DEFAULT_PLAN_TEMPERATURE);
            StageOptions::new(RetryPolicy::default()).with_temperature(temperature)
        });
        Self {
            model: DEFAULT_MODEL.to_string(),
            stages,
            repair_policy: RepairPolicy::default(),
        }
    }
}

fn slot(stage: StageId) -> usize {
    match stage {
        StageId::Plan => 0,
        StageId::Part => 1,
        StageId::Validate => 2,
        StageId::Repair => 3,
    }
}

/// Sends single-prompt requests for a stage through the resilient invoker.
#[derive(Clone)]
pub struct StageClient {
    invoker: ResilientInvoker,
    settings: EngineSettings,
    run_id: String,
}

impl StageClient {
    #[must_use]
    pub fn new(invoker: ResilientInvoker, settings: EngineSettings, run_id: impl Into<String>) -> Self {
        Self {
            invoker,
            settings,
            run_id: run_id.into(),
        }
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Send `prompt` with the stage's policy and temperature.
    ///
    /// `operation` names the call in logs and in `ExhaustedRetries`.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::ExhaustedRetries` when every attempt failed.
    pub async fn complete(
        &self,
        stage: StageId,
        operation: &str,
        prompt: String,
    ) -> Result<String, ForgeError> {
        let options = self.settings.stage(stage);
        let invocation = LlmInvocation::new(
            self.run_id.clone(),
            operation,
            self.settings.model.clone(),
            options.policy.timeout,
            vec![Message::user(prompt)],
        )
        .with_temperature(options.temperature);

        self.invoker
            .invoke(invocation, operation, &options.policy)
            .await
    }
}
