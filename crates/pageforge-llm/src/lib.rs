//! Generation service backends
//!
//! Every provider implements the `LlmBackend` trait, so the engine drives any
//! of them without knowing implementation details. Backends make exactly one
//! attempt per call.

mod anthropic_backend;
mod http_client;
mod ollama_backend;
#[cfg(any(test, feature = "test-utils"))]
mod scripted;
mod types;

pub use http_client::redact_error_message;
pub use pageforge_utils::error::LlmError;
#[cfg(any(test, feature = "test-utils"))]
pub use scripted::{ScriptedBackend, ScriptedReply};
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

use anthropic_backend::AnthropicBackend;
use ollama_backend::OllamaBackend;
use pageforge_config::Config;
use std::sync::Arc;

/// Create a backend from configuration.
///
/// ## Supported Providers
///
/// - **`ollama`** (default): local Ollama server, `[llm] base_url` defaults to
///   `http://localhost:11434`
/// - **`anthropic`**: Anthropic Messages API; needs `[llm] model` and an API
///   key in the variable named by `[llm] api_key_env`
///
/// # Errors
///
/// Returns `LlmError::Unsupported` for an unknown provider and
/// `LlmError::Misconfiguration` when provider settings are incomplete.
pub fn from_config(config: &Config) -> Result<Arc<dyn LlmBackend>, LlmError> {
    match config.provider() {
        "ollama" => Ok(Arc::new(OllamaBackend::new_from_config(config)?)),
        "anthropic" => Ok(Arc::new(AnthropicBackend::new_from_config(config)?)),
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown LLM provider '{unknown}'. Supported providers: ollama, anthropic."
        ))),
    }
}
