//! Structural plan synthesis
//!
//! A [`Plan`] always holds [`SECTION_COUNT`] sections, each findable by its
//! `PART i` label. Sections the service left out are appended from static
//! templates; when the service cannot be reached at all the plan is built
//! from the templates alone. Synthesis therefore never fails.

use crate::classifier::{TaskCategory, classify};
use crate::client::StageClient;
use crate::prompts;
use once_cell::sync::Lazy;
use pageforge_utils::logging::truncate_for_log;
use pageforge_utils::types::StageId;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

/// Number of sections in every plan.
pub const SECTION_COUNT: usize = 5;

static SECTION_LABELS: Lazy<Vec<Regex>> = Lazy::new(|| {
    (1..=SECTION_COUNT)
        .map(|i| Regex::new(&format!(r"(?i)\bpart\s+{i}\b")).expect("valid regex literal"))
        .collect()
});

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[a-z]*\s*").expect("valid regex literal"));

/// Stand-in text for one section, independent of the goal.
#[must_use]
pub fn section_template(index: usize) -> &'static str {
    match index {
        1 => {
            "PART 1: HEADER & NAVIGATION\n\
             - Main header with branding/logo\n\
             - Navigation menu structure\n\
             - Search functionality (if applicable)\n\
             - User account controls"
        }
        2 => {
            "PART 2: HERO SECTION / MAIN CONTENT AREA\n\
             - Primary content area layout\n\
             - Key visual elements\n\
             - Call-to-action components\n\
             - Content hierarchy"
        }
        3 => {
            "PART 3: FEATURE SECTIONS / CONTENT BLOCKS\n\
             - Secondary content areas\n\
             - Feature highlights\n\
             - Information organization\n\
             - Interactive elements"
        }
        4 => {
            "PART 4: SIDEBAR / SUPPORTING CONTENT\n\
             - Secondary navigation\n\
             - Related content\n\
             - Widgets or tools\n\
             - Additional functionality"
        }
        5 => {
            "PART 5: FOOTER & FINAL ELEMENTS\n\
             - Footer structure\n\
             - Contact information\n\
             - Legal links\n\
             - Social media integration"
        }
        _ => "",
    }
}

/// How the plan text came to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanSource {
    /// The service returned all sections.
    Synthesized,
    /// The service's plan lacked these sections; templates were appended.
    Backfilled { missing: Vec<usize> },
    /// The service could not be reached; the plan is all templates.
    Fallback,
}

/// Read-only structural plan for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    text: String,
    source: PlanSource,
    category: TaskCategory,
}

impl Plan {
    /// Shape a raw service response into a plan.
    ///
    /// Code fences are removed, the text is trimmed and each missing section
    /// is appended from its template.
    #[must_use]
    pub fn from_response(raw: &str, category: TaskCategory) -> Self {
        let mut text = CODE_FENCE.replace_all(raw, "").trim().to_string();
        let missing = missing_sections(&text);

        for &index in &missing {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(section_template(index));
        }

        let source = if missing.is_empty() {
            PlanSource::Synthesized
        } else {
            PlanSource::Backfilled { missing }
        };
        Self {
            text,
            source,
            category,
        }
    }

    /// Plan built only from templates, headed by the goal.
    #[must_use]
    pub fn fallback(goal: &str, category: TaskCategory) -> Self {
        let mut text = format!("PLAN FOR: {goal}");
        for index in 1..=SECTION_COUNT {
            text.push_str("\n\n");
            text.push_str(section_template(index));
        }
        Self {
            text,
            source: PlanSource::Fallback,
            category,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn source(&self) -> &PlanSource {
        &self.source
    }

    #[must_use]
    pub fn category(&self) -> TaskCategory {
        self.category
    }

    /// Whether section `index` is locatable by its label.
    #[must_use]
    pub fn has_section(&self, index: usize) -> bool {
        has_label(&self.text, index)
    }
}

fn has_label(text: &str, index: usize) -> bool {
    index
        .checked_sub(1)
        .and_then(|slot| SECTION_LABELS.get(slot))
        .is_some_and(|label| label.is_match(text))
}

/// Indices in `1..=SECTION_COUNT` with no label in `text`.
#[must_use]
pub fn missing_sections(text: &str) -> Vec<usize> {
    (1..=SECTION_COUNT)
        .filter(|&i| !has_label(text, i))
        .collect()
}

/// Produces the plan for a goal.
pub struct PlanSynthesizer<'a> {
    client: &'a StageClient,
}

impl<'a> PlanSynthesizer<'a> {
    #[must_use]
    pub fn new(client: &'a StageClient) -> Self {
        Self { client }
    }

    pub async fn synthesize(&self, goal: &str) -> Plan {
        self.synthesize_for(goal, classify(goal)).await
    }

    /// Synthesize with an already known category.
    pub async fn synthesize_for(&self, goal: &str, category: TaskCategory) -> Plan {
        let prompt = prompts::plan_prompt(goal, category);
        match self
            .client
            .complete(StageId::Plan, StageId::Plan.as_str(), prompt)
            .await
        {
            Ok(raw) => {
                let plan = Plan::from_response(&raw, category);
                match plan.source() {
                    PlanSource::Backfilled { missing } => warn!(
                        missing = ?missing,
                        "Plan was missing sections, appended templates"
                    ),
                    _ => info!(chars = plan.text().len(), "Plan synthesized"),
                }
                plan
            }
            Err(err) => {
                warn!(
                    error = %truncate_for_log(&err.to_string(), 256),
                    "Planning failed, using fallback plan"
                );
                Plan::fallback(goal, category)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EngineSettings;
    use crate::invoker::{ResilientInvoker, RetryPolicy};
    use pageforge_llm::{ScriptedBackend, ScriptedReply};
    use std::sync::Arc;

    fn client(backend: &ScriptedBackend) -> StageClient {
        StageClient::new(
            ResilientInvoker::new(Arc::new(backend.clone())),
            EngineSettings::default().with_retry_policy(RetryPolicy::immediate(2)),
            "test-run",
        )
    }

    fn assert_complete(plan: &Plan) {
        for i in 1..=SECTION_COUNT {
            assert!(plan.has_section(i), "section {i} missing in:\n{}", plan.text());
        }
    }

    #[test]
    fn test_complete_response_is_kept() {
        let raw = (1..=5)
            .map(|i| format!("Part {i}: something\n- item"))
            .collect::<Vec<_>>()
            .join("\n");
        let plan = Plan::from_response(&raw, TaskCategory::General);
        assert_eq!(plan.source(), &PlanSource::Synthesized);
        assert_eq!(plan.text(), raw);
    }

    #[test]
    fn test_missing_sections_are_backfilled_in_order() {
        let raw = "PART 1: top\nPART 3: middle\nPART 5: bottom";
        let plan = Plan::from_response(raw, TaskCategory::Dashboard);

        assert_eq!(plan.source(), &PlanSource::Backfilled {
            missing: vec![2, 4]
        });
        assert_complete(&plan);
        assert!(plan.text().starts_with(raw));
        let p2 = plan.text().find("PART 2: HERO").unwrap();
        let p4 = plan.text().find("PART 4: SIDEBAR").unwrap();
        assert!(p2 < p4);
    }

    #[test]
    fn test_label_does_not_match_longer_number() {
        assert!(!has_label("PART 12 only", 1));
        assert!(has_label("**part 1**", 1));
        assert!(!has_label("PART 1", 0));
        assert!(!has_label("PART 6", 6));
    }

    #[test]
    fn test_code_fences_are_stripped() {
        let plan = Plan::from_response("```markdown\nPART 1 a\n```", TaskCategory::General);
        assert!(!plan.text().contains("```"));
        assert!(plan.text().starts_with("PART 1 a"));
    }

    #[test]
    fn test_empty_response_becomes_all_templates() {
        let plan = Plan::from_response("   ", TaskCategory::General);
        assert_eq!(plan.source(), &PlanSource::Backfilled {
            missing: vec![1, 2, 3, 4, 5]
        });
        assert!(plan.text().starts_with("PART 1: HEADER"));
        assert_complete(&plan);
    }

    #[test]
    fn test_fallback_restates_goal() {
        let plan = Plan::fallback("a cat cafe", TaskCategory::General);
        assert!(plan.text().starts_with("PLAN FOR: a cat cafe\n\nPART 1"));
        assert_eq!(plan.source(), &PlanSource::Fallback);
        assert_complete(&plan);
    }

    #[tokio::test]
    async fn test_synthesize_uses_plan_stage_temperature() {
        let backend = ScriptedBackend::always(ScriptedReply::text("PART 1\nPART 2\nPART 3"));
        let plan = PlanSynthesizer::new(&client(&backend))
            .synthesize("admin dashboard")
            .await;

        assert_eq!(plan.category(), TaskCategory::Dashboard);
        assert_eq!(plan.source(), &PlanSource::Backfilled {
            missing: vec![4, 5]
        });
        let seen = backend.invocations();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature(), Some(0.7));
        assert!(seen[0].prompt_text().contains("admin dashboard"));
    }

    #[tokio::test]
    async fn test_exhausted_service_yields_fallback() {
        let backend = ScriptedBackend::always_failing();
        let plan = PlanSynthesizer::new(&client(&backend))
            .synthesize("my blog")
            .await;

        assert_eq!(plan.source(), &PlanSource::Fallback);
        assert_eq!(backend.call_count(), 2);
        assert_complete(&plan);
    }
}
