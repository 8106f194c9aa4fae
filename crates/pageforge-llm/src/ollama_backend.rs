//! Ollama HTTP backend
//!
//! Talks to a local Ollama server through its non-streaming chat endpoint
//! (`POST /api/chat` with `stream: false`).

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default Ollama server address
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Clone)]
pub(crate) struct OllamaBackend {
    client: Arc<HttpClient>,
    endpoint: String,
    default_model: String,
    /// `num_predict` sent when the invocation does not carry `max_tokens`.
    default_max_tokens: Option<u32>,
}

impl OllamaBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        base_url: Option<&str>,
        default_model: String,
        default_max_tokens: Option<u32>,
    ) -> Result<Self, LlmError> {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            endpoint: format!("{base}/api/chat"),
            default_model,
            default_max_tokens,
        })
    }

    pub fn new_from_config(config: &pageforge_config::Config) -> Result<Self, LlmError> {
        Self::new(
            config.llm.base_url.as_deref(),
            config.model().to_string(),
            config.llm.max_tokens,
        )
    }

    fn build_request(&self, inv: &LlmInvocation) -> OllamaRequest {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        let num_predict = inv
            .metadata
            .get("max_tokens")
            .and_then(serde_json::Value::as_u64)
            .or(self.default_max_tokens.map(u64::from));

        let options = match (inv.temperature(), num_predict) {
            (None, None) => None,
            (temperature, num_predict) => Some(OllamaOptions {
                temperature,
                num_predict,
            }),
        };

        OllamaRequest {
            model,
            messages: inv.messages.clone(),
            stream: false,
            options,
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let body = self.build_request(&inv);

        debug!(
            provider = "ollama",
            model = %body.model,
            stage = %inv.stage,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Ollama backend"
        );

        let request = self.client.post(&self.endpoint).json(&body);
        let response = self.client.execute(request, inv.timeout, "ollama").await?;

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse Ollama response: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(LlmError::ProviderOutage(format!("ollama reported: {error}")));
        }

        let content = parsed.message.map(|m| m.content).unwrap_or_default();
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse("ollama".to_string()));
        }

        Ok(LlmResult::new(content, "ollama", parsed.model.unwrap_or(body.model))
            .with_tokens(parsed.prompt_eval_count, parsed.eval_count))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[derive(Debug, Clone, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaResponse {
    model: Option<String>,
    message: Option<Message>,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
    error: Option<String>,
}
