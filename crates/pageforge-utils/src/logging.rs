//! Logging infrastructure for pageforge
//!
//! Structured logging with `tracing`. Every generation run is wrapped in a
//! `run` span carrying the run id; every stage gets its own span and
//! start/complete/error events with `stage` and `duration_ms` fields.

use std::io::IsTerminal;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Check if colored output should be used.
///
/// Returns true only if stderr is a terminal and NO_COLOR is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Filter directives used when `RUST_LOG` is not set.
#[must_use]
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "pageforge=debug,pageforge_engine=debug,pageforge_llm=debug,info"
    } else {
        "pageforge=info,pageforge_engine=info,pageforge_llm=warn,warn"
    }
}

/// Initialize the tracing subscriber.
///
/// Compact human-readable output goes to stderr so `--print` can use stdout
/// for the page itself. Verbose mode adds targets and span close events.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span covering one whole generation run.
pub fn run_span(run_id: &str, category: &str) -> tracing::Span {
    span!(Level::INFO, "run", run_id = %run_id, category = %category)
}

/// Span covering a single stage of a run.
pub fn stage_span(stage: &str, index: Option<usize>) -> tracing::Span {
    match index {
        Some(index) => span!(Level::INFO, "stage", stage = %stage, index = index),
        None => span!(Level::INFO, "stage", stage = %stage),
    }
}

pub fn log_stage_start(stage: &str) {
    info!(stage = %stage, "Stage started");
}

pub fn log_stage_complete(stage: &str, duration_ms: u128) {
    info!(stage = %stage, duration_ms = %duration_ms, "Stage completed");
}

/// Log a stage failure. The message is truncated so oversized provider
/// bodies do not flood the log.
pub fn log_stage_error(stage: &str, error: &str, duration_ms: u128) {
    error!(
        stage = %stage,
        error = %truncate_for_log(error, 512),
        duration_ms = %duration_ms,
        "Stage failed"
    );
}

/// Truncate `text` to at most `max_chars` characters, marking the cut.
#[must_use]
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
