//! CLI command implementations

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use crate::llm::LlmBackend;
use crate::{Config, EngineSettings, FileSink, ForgeError, Orchestrator, classify};
use pageforge_engine::Goal;
use pageforge_engine::sink::strip_fence_markers;

// ============================================================================
// Generate Command
// ============================================================================

fn orchestrator(config: &Config) -> Result<Orchestrator, ForgeError> {
    let backend: Arc<dyn LlmBackend> = crate::llm::from_config(config)?;
    debug!(
        provider = config.provider(),
        model = config.model(),
        "Generation backend ready"
    );
    Ok(Orchestrator::new(backend, EngineSettings::from_config(config)))
}

/// Run the whole pipeline and write (or print) the page.
pub async fn execute_generate_command(
    goal: &str,
    print: bool,
    json: bool,
    config: &Config,
) -> Result<()> {
    let orchestrator = orchestrator(config)?;

    if print {
        let outcome = orchestrator.run(goal).await?;
        println!("{}", strip_fence_markers(outcome.artifact.as_str()));
        return Ok(());
    }

    let sink = FileSink::new(config.output_path());
    let (outcome, location) = orchestrator.run_into(goal, &sink).await?;
    let report = &outcome.report;

    if json {
        let rendered =
            serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
        println!("{rendered}");
        return Ok(());
    }

    let verdict = match &report.final_verdict {
        Some(v) if v.is_valid() => "valid",
        Some(_) => "not confirmed valid",
        None => "not reviewed",
    };
    println!("✓ Page written to {location}");
    println!(
        "  category: {}, validations: {}, repairs: {}, review: {verdict}",
        report.category, report.validations, report.repairs
    );
    Ok(())
}

// ============================================================================
// Plan Command
// ============================================================================

pub async fn execute_plan_command(goal: &str, config: &Config) -> Result<()> {
    let plan = orchestrator(config)?.plan(goal).await?;
    let source = match plan.source() {
        crate::PlanSource::Synthesized => "synthesized".to_string(),
        crate::PlanSource::Backfilled { missing } => format!(
            "backfilled (missing parts: {})",
            missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        crate::PlanSource::Fallback => "fallback template".to_string(),
    };

    println!("Category: {}", plan.category());
    println!("Source:   {source}");
    println!();
    println!("{}", plan.text());
    Ok(())
}

// ============================================================================
// Classify Command
// ============================================================================

pub fn execute_classify_command(goal: &str) -> Result<()> {
    let goal = Goal::new(goal)?;
    let category = classify(goal.as_str());
    println!("Category: {category}");
    println!("Priority: {}", category.priority());
    println!("Guidance: {}", category.guidance());
    Ok(())
}

// ============================================================================
// Config Command
// ============================================================================

pub fn execute_config_command(config: &Config, json: bool) -> Result<()> {
    let settings = config.retry_settings();
    let rows: Vec<(&str, String)> = vec![
        ("llm_provider", config.provider().to_string()),
        ("llm_model", config.model().to_string()),
        ("max_attempts", settings.max_attempts.to_string()),
        ("timeout_secs", settings.timeout.as_secs().to_string()),
        ("backoff", settings.backoff.to_string()),
        ("repair_max_rounds", config.max_repair_rounds().to_string()),
        ("repair_revalidate", config.revalidate().to_string()),
        ("output_path", config.output_path().display().to_string()),
    ];

    let source = |key: &str| {
        config
            .source_of(key)
            .map_or_else(|| "default".to_string(), ToString::to_string)
    };

    if json {
        let map: serde_json::Map<String, serde_json::Value> = rows
            .iter()
            .map(|(key, value)| {
                (
                    (*key).to_string(),
                    serde_json::json!({ "value": value, "source": source(key) }),
                )
            })
            .collect();
        let rendered = serde_json::to_string_pretty(&serde_json::Value::Object(map))
            .context("Failed to serialize configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Effective configuration:");
    for (key, value) in &rows {
        println!("  {key:<18} = {value:<24} [{}]", source(key));
    }
    Ok(())
}
