//! Run orchestration
//!
//! A run is a small state machine:
//!
//! ```text
//! Planning -> Generating(1..=5) -> Combining -> Validating -> Done
//!                                                  |    ^
//!                                                  v    | (revalidate)
//!                                               Repairing -> Done
//! ```
//!
//! Each step consumes the previous one and returns the next, carrying the
//! plan, the accumulated parts or the artifact by value. Nothing is shared
//! between runs.

use crate::classifier::{TaskCategory, classify};
use crate::client::{EngineSettings, StageClient};
use crate::combine::{Artifact, PartSet, combine};
use crate::invoker::{AttemptObserver, ResilientInvoker, TracingObserver};
use crate::part::PartGenerator;
use crate::plan::{Plan, PlanSource, PlanSynthesizer, SECTION_COUNT};
use crate::repair::Repairer;
use crate::sink::ArtifactSink;
use crate::validate::{Validator, Verdict};
use chrono::{DateTime, Utc};
use pageforge_llm::LlmBackend;
use pageforge_utils::error::ForgeError;
use pageforge_utils::logging::{
    log_stage_complete, log_stage_error, log_stage_start, run_span, stage_span,
};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;
use tracing::{Instrument, info, warn};

/// Observable state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Planning,
    Generating { index: usize },
    Combining,
    Validating,
    Repairing,
    Done,
}

impl RunState {
    fn label(&self) -> &'static str {
        match self {
            Self::Planning => "plan",
            Self::Generating { .. } => "part",
            Self::Combining => "combine",
            Self::Validating => "validate",
            Self::Repairing => "repair",
            Self::Done => "done",
        }
    }
}

/// What happened during a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub goal: String,
    pub category: TaskCategory,
    pub plan_source: Option<PlanSource>,
    /// Every state entered, in order.
    pub transitions: Vec<RunState>,
    pub validations: u32,
    pub repairs: u32,
    /// Verdict of the last validation, if any ran.
    pub final_verdict: Option<Verdict>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    fn new(run_id: String, goal: &str, category: TaskCategory) -> Self {
        Self {
            run_id,
            goal: goal.to_string(),
            category,
            plan_source: None,
            transitions: Vec::new(),
            validations: 0,
            repairs: 0,
            final_verdict: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Number of times `state` was entered.
    #[must_use]
    pub fn count(&self, state: RunState) -> usize {
        self.transitions.iter().filter(|s| **s == state).count()
    }

    #[must_use]
    pub fn entered_repair(&self) -> bool {
        self.count(RunState::Repairing) > 0
    }
}

/// Final artifact and report of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub artifact: Artifact,
    pub report: RunReport,
}

/// Validated, non-empty goal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal(String);

impl Goal {
    /// # Errors
    ///
    /// Returns `ForgeError::EmptyGoal` for empty or whitespace-only input.
    pub fn new(text: &str) -> Result<Self, ForgeError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ForgeError::EmptyGoal);
        }
        Ok(Self(text.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

enum Step {
    Planning,
    Generating {
        plan: Plan,
        parts: PartSet,
        index: usize,
    },
    Combining {
        parts: PartSet,
    },
    Validating {
        artifact: Artifact,
    },
    Repairing {
        artifact: Artifact,
        feedback: String,
    },
    Done {
        artifact: Artifact,
    },
}

impl Step {
    fn state(&self) -> RunState {
        match self {
            Self::Planning => RunState::Planning,
            Self::Generating { index, .. } => RunState::Generating { index: *index },
            Self::Combining { .. } => RunState::Combining,
            Self::Validating { .. } => RunState::Validating,
            Self::Repairing { .. } => RunState::Repairing,
            Self::Done { .. } => RunState::Done,
        }
    }
}

static RUN_COUNTER: AtomicU32 = AtomicU32::new(0);

fn new_run_id() -> String {
    let seq = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}-{:05}-{seq}",
        Utc::now().format("%Y%m%dT%H%M%S"),
        std::process::id() % 100_000
    )
}

/// Drives runs against one backend.
pub struct Orchestrator {
    backend: Arc<dyn LlmBackend>,
    observer: Arc<dyn AttemptObserver>,
    settings: EngineSettings,
}

impl Orchestrator {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, settings: EngineSettings) -> Self {
        Self {
            backend,
            observer: Arc::new(TracingObserver),
            settings,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn AttemptObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn client(&self, run_id: &str) -> StageClient {
        StageClient::new(
            ResilientInvoker::with_observer(self.backend.clone(), self.observer.clone()),
            self.settings.clone(),
            run_id,
        )
    }

    /// Classify and plan only.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::EmptyGoal` for a blank goal. Planning itself
    /// never fails.
    pub async fn plan(&self, goal: &str) -> Result<Plan, ForgeError> {
        let goal = Goal::new(goal)?;
        let run_id = new_run_id();
        let category = classify(goal.as_str());
        let client = self.client(&run_id);
        Ok(PlanSynthesizer::new(&client)
            .synthesize_for(goal.as_str(), category)
            .instrument(run_span(&run_id, category.as_str()))
            .await)
    }

    /// Run a goal to completion and hand the artifact to `sink`.
    ///
    /// # Errors
    ///
    /// Fails like [`run`](Self::run); the sink is not called on failure.
    /// Sink errors are returned as `ForgeError::Sink`.
    pub async fn run_into(
        &self,
        goal: &str,
        sink: &dyn ArtifactSink,
    ) -> Result<(RunOutcome, String), ForgeError> {
        let outcome = self.run(goal).await?;
        let location = sink.persist(&outcome.artifact)?;
        Ok((outcome, location))
    }

    /// Run a goal to completion.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::EmptyGoal` for a blank goal and
    /// `ForgeError::ExhaustedRetries` when a part, validation or repair call
    /// spent its attempts. No artifact is produced on failure.
    pub async fn run(&self, goal: &str) -> Result<RunOutcome, ForgeError> {
        let goal = Goal::new(goal)?;
        let run_id = new_run_id();
        let category = classify(goal.as_str());
        let span = run_span(&run_id, category.as_str());

        async move {
            info!(goal = %goal.as_str(), "Run started");
            let client = self.client(&run_id);
            let mut report = RunReport::new(run_id, goal.as_str(), category);
            let mut step = Step::Planning;

            loop {
                report.transitions.push(step.state());
                if let Step::Done { artifact } = step {
                    report.finished_at = Some(Utc::now());
                    info!(
                        validations = report.validations,
                        repairs = report.repairs,
                        "Run finished"
                    );
                    return Ok(RunOutcome { artifact, report });
                }
                step = self
                    .advance(&client, &goal, category, step, &mut report)
                    .await?;
            }
        }
        .instrument(span)
        .await
    }

    async fn advance(
        &self,
        client: &StageClient,
        goal: &Goal,
        category: TaskCategory,
        step: Step,
        report: &mut RunReport,
    ) -> Result<Step, ForgeError> {
        let state = step.state();
        let label = state.label();
        let index = match state {
            RunState::Generating { index } => Some(index),
            _ => None,
        };

        async move {
            log_stage_start(label);
            let started = Instant::now();
            let result = self.transition(client, goal, category, step, report).await;
            let elapsed = started.elapsed().as_millis();
            match &result {
                Ok(_) => log_stage_complete(label, elapsed),
                Err(err) => log_stage_error(label, &err.to_string(), elapsed),
            }
            result
        }
        .instrument(stage_span(label, index))
        .await
    }

    async fn transition(
        &self,
        client: &StageClient,
        goal: &Goal,
        category: TaskCategory,
        step: Step,
        report: &mut RunReport,
    ) -> Result<Step, ForgeError> {
        let policy = self.settings.repair_policy;

        let next = match step {
            Step::Planning => {
                let plan = PlanSynthesizer::new(client)
                    .synthesize_for(goal.as_str(), category)
                    .await;
                report.plan_source = Some(plan.source().clone());
                Step::Generating {
                    plan,
                    parts: PartSet::new(),
                    index: 1,
                }
            }
            Step::Generating { plan, parts, index } => {
                let part = PartGenerator::new(client)
                    .generate(index, &plan, goal.as_str())
                    .await?;
                let parts = parts.with_part(part);
                if index < SECTION_COUNT {
                    Step::Generating {
                        plan,
                        parts,
                        index: index + 1,
                    }
                } else {
                    Step::Combining { parts }
                }
            }
            Step::Combining { parts } => {
                debug_assert!(parts.is_complete(SECTION_COUNT));
                Step::Validating {
                    artifact: combine(&parts),
                }
            }
            Step::Validating { artifact } => {
                let verdict = Validator::new(client).validate(&artifact).await?;
                report.validations += 1;
                report.final_verdict = Some(verdict.clone());
                match verdict {
                    Verdict::Valid => Step::Done { artifact },
                    Verdict::Invalid(feedback) if report.repairs < policy.max_rounds() => {
                        Step::Repairing { artifact, feedback }
                    }
                    Verdict::Invalid(_) => {
                        warn!(
                            repairs = report.repairs,
                            "Repair budget spent, keeping the last artifact"
                        );
                        Step::Done { artifact }
                    }
                }
            }
            Step::Repairing { artifact, feedback } => {
                let artifact = Repairer::new(client).repair(&artifact, &feedback).await?;
                report.repairs += 1;
                if policy.revalidate {
                    Step::Validating { artifact }
                } else {
                    Step::Done { artifact }
                }
            }
            Step::Done { artifact } => Step::Done { artifact },
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RepairPolicy;
    use crate::invoker::RetryPolicy;
    use crate::sink::MemorySink;
    use pageforge_llm::{ScriptedBackend, ScriptedReply};

    const FULL_PLAN: &str = "PART 1: nav\nPART 2: hero\nPART 3: features\nPART 4: aside\nPART 5: footer";

    fn part_replies() -> Vec<ScriptedReply> {
        (1..=5)
            .map(|i| ScriptedReply::text(format!("<section id=\"p{i}\"></section>")))
            .collect()
    }

    fn orchestrator(backend: &ScriptedBackend, repair: RepairPolicy) -> Orchestrator {
        let settings = EngineSettings::default()
            .with_retry_policy(RetryPolicy::immediate(2))
            .with_repair_policy(repair);
        Orchestrator::new(Arc::new(backend.clone()), settings)
    }

    fn script(tail: impl IntoIterator<Item = ScriptedReply>) -> ScriptedBackend {
        let mut replies = vec![ScriptedReply::text(FULL_PLAN)];
        replies.extend(part_replies());
        replies.extend(tail);
        ScriptedBackend::new(replies)
    }

    fn generating(index: usize) -> RunState {
        RunState::Generating { index }
    }

    #[tokio::test]
    async fn test_valid_run_state_sequence() {
        let backend = script([ScriptedReply::text("VALID")]);
        let outcome = orchestrator(&backend, RepairPolicy::default())
            .run("a landing page")
            .await
            .unwrap();

        assert_eq!(outcome.report.transitions, vec![
            RunState::Planning,
            generating(1),
            generating(2),
            generating(3),
            generating(4),
            generating(5),
            RunState::Combining,
            RunState::Validating,
            RunState::Done,
        ]);
        assert_eq!(outcome.report.category, TaskCategory::Landing);
        assert_eq!(outcome.report.plan_source, Some(PlanSource::Synthesized));
        assert_eq!(outcome.report.final_verdict, Some(Verdict::Valid));
        assert!(outcome.report.finished_at.is_some());
        assert!(outcome.artifact.as_str().contains("<section id=\"p5\">"));
        assert_eq!(backend.stages(), vec![
            "plan", "part 1", "part 2", "part 3", "part 4", "part 5", "validate"
        ]);
    }

    #[tokio::test]
    async fn test_invalid_verdict_repairs_once_without_revalidation() {
        let backend = script([
            ScriptedReply::text("ERROR: missing closing tag"),
            ScriptedReply::text("<html>fixed</html>"),
        ]);
        let outcome = orchestrator(&backend, RepairPolicy::default())
            .run("a landing page")
            .await
            .unwrap();

        assert_eq!(outcome.artifact.as_str(), "<html>fixed</html>");
        assert_eq!(outcome.report.count(RunState::Validating), 1);
        assert_eq!(outcome.report.count(RunState::Repairing), 1);
        assert_eq!(outcome.report.transitions.last(), Some(&RunState::Done));
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn test_revalidation_is_bounded_by_max_rounds() {
        let backend = script([
            ScriptedReply::text("ERROR: one"),
            ScriptedReply::text("<html>r1</html>"),
            ScriptedReply::text("ERROR: two"),
            ScriptedReply::text("<html>r2</html>"),
            ScriptedReply::text("ERROR: three"),
        ]);
        let policy = RepairPolicy::new(2, true);
        let outcome = orchestrator(&backend, policy).run("blog").await.unwrap();

        assert_eq!(outcome.report.repairs, 2);
        assert_eq!(outcome.report.validations, 3);
        assert_eq!(outcome.artifact.as_str(), "<html>r2</html>");
        assert_eq!(
            outcome.report.final_verdict,
            Some(Verdict::Invalid("ERROR: three".to_string()))
        );
    }

    #[tokio::test]
    async fn test_revalidation_stops_once_valid() {
        let backend = script([
            ScriptedReply::text("ERROR: one"),
            ScriptedReply::text("<html>r1</html>"),
            ScriptedReply::text("VALID"),
        ]);
        let policy = RepairPolicy::new(5, true);
        let outcome = orchestrator(&backend, policy).run("blog").await.unwrap();

        assert_eq!(outcome.report.repairs, 1);
        assert_eq!(outcome.report.final_verdict, Some(Verdict::Valid));
    }

    #[tokio::test]
    async fn test_zero_round_policy_still_repairs_once() {
        let backend = script([
            ScriptedReply::text("ERROR: unclosed div"),
            ScriptedReply::text("<html>fixed</html>"),
        ]);
        let outcome = orchestrator(&backend, RepairPolicy::new(0, false))
            .run("blog")
            .await
            .unwrap();

        assert_eq!(outcome.report.repairs, 1);
        assert_eq!(outcome.artifact.as_str(), "<html>fixed</html>");
    }

    #[tokio::test]
    async fn test_part_failure_is_fatal_and_nothing_is_persisted() {
        let backend = ScriptedBackend::new([
            ScriptedReply::text(FULL_PLAN),
            ScriptedReply::text("<header></header>"),
        ])
        .with_fallback(ScriptedReply::transport_error("down"));
        let sink = MemorySink::new();

        let err = orchestrator(&backend, RepairPolicy::default())
            .run_into("a page", &sink)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ForgeError::ExhaustedRetries { ref operation, attempts: 2, .. } if operation == "part 2"
        ));
        assert!(sink.stored().is_empty());
    }

    #[tokio::test]
    async fn test_empty_goal_is_rejected_before_any_call() {
        let backend = ScriptedBackend::always_failing();
        let err = orchestrator(&backend, RepairPolicy::default())
            .run("   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::EmptyGoal));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_into_persists_final_artifact() {
        let backend = script([ScriptedReply::text("VALID")]);
        let sink = MemorySink::new();

        let (outcome, location) = orchestrator(&backend, RepairPolicy::default())
            .run_into("a page", &sink)
            .await
            .unwrap();

        assert_eq!(location, "memory #1");
        assert_eq!(sink.stored(), vec![outcome.artifact.into_string()]);
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(new_run_id(), new_run_id());
    }

    #[test]
    fn test_report_serializes() {
        let report = RunReport::new("r".to_string(), "g", TaskCategory::General);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["category"], "general");
        assert_eq!(json["transitions"], serde_json::json!([]));
    }
}
