//! pageforge - plan, generate, validate and repair single-page HTML documents
//!
//! pageforge turns one natural-language goal into one HTML page by driving a
//! text-generation service through a fixed sequence of stages:
//!
//! ```text
//! classify -> plan (5 parts) -> generate parts -> combine -> validate -> repair
//! ```
//!
//! Every call to the service is wrapped with a per-attempt timeout, bounded
//! retries and backoff. Planning never fails outward: missing plan sections
//! are filled from templates and an unreachable service yields a template
//! plan. Any other stage that spends its attempts ends the run without
//! writing a page.
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Generate a page with a local Ollama server
//! pageforge generate "a landing page for a bakery"
//!
//! # Only show the plan
//! pageforge plan "an admin dashboard for a bike shop"
//!
//! # Show the effective configuration and where each value came from
//! pageforge config
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use pageforge::{Config, EngineSettings, FileSink, Orchestrator};
//!
//! # async fn demo() -> Result<(), pageforge::ForgeError> {
//! let config = Config::builder().model("qwen3-coder").build()?;
//! let backend = pageforge::llm::from_config(&config)?;
//! let orchestrator = Orchestrator::new(backend, EngineSettings::from_config(&config));
//! let (outcome, location) = orchestrator
//!     .run_into("a portfolio for a photographer", &FileSink::new("page.html"))
//!     .await?;
//! println!("{} repairs, written to {location}", outcome.report.repairs);
//! # Ok(())
//! # }
//! ```

pub mod cli;

pub use pageforge_llm as llm;

/// Configuration with discovery and precedence: CLI > config file > defaults.
pub use pageforge_config::{CliArgs, Config, ConfigBuilder};

/// Library error type with user-facing reporting and exit code mapping.
pub use pageforge_utils::error::{ConfigError, ErrorCategory, ForgeError, LlmError};

/// Exit codes of the `pageforge` binary.
pub use pageforge_utils::exit_codes::ExitCode;

pub use pageforge_utils::types::StageId;

pub use pageforge_engine::{
    Artifact, ArtifactSink, EngineSettings, FileSink, MemorySink, Orchestrator, Plan, PlanSource,
    RepairPolicy, RetryPolicy, RunOutcome, RunReport, RunState, TaskCategory, Verdict, classify,
};
