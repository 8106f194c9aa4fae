//! Generation, validation and repair of single-page documents
//!
//! The engine turns one natural-language goal into one HTML page:
//! classify the goal, synthesize a five-part plan, generate each part,
//! combine them, have the result reviewed and repair it when the review
//! fails. Every call to the generation service goes through
//! [`ResilientInvoker`], which owns timeouts, retries and backoff.

pub mod classifier;
pub mod client;
pub mod combine;
pub mod context;
pub mod invoker;
pub mod orchestrator;
pub mod part;
pub mod plan;
mod prompts;
pub mod repair;
pub mod sink;
pub mod validate;

pub use classifier::{TaskCategory, classify};
pub use client::{EngineSettings, RepairPolicy, StageClient, StageOptions};
pub use combine::{Artifact, PartSet, combine};
pub use context::{PartContext, extract};
pub use invoker::{
    AttemptObserver, AttemptOutcome, Backoff, InvocationAttempt, RecordingObserver,
    ResilientInvoker, RetryPolicy, TracingObserver,
};
pub use orchestrator::{Goal, Orchestrator, RunOutcome, RunReport, RunState};
pub use part::{PartContent, PartGenerator, normalize};
pub use plan::{Plan, PlanSource, PlanSynthesizer, SECTION_COUNT};
pub use repair::Repairer;
pub use sink::{ArtifactSink, FileSink, MemorySink};
pub use validate::{Validator, Verdict, parse_verdict};
