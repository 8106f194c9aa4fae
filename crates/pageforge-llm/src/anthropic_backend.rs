//! Anthropic HTTP backend implementation
//!
//! HTTP backend for Anthropic's Messages API.

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default Anthropic API endpoint
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default API key variable
const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Generated pages are long; the default leaves room for a full document.
const DEFAULT_MAX_TOKENS: u32 = 8192;

#[derive(Clone)]
pub(crate) struct AnthropicBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    default_max_tokens: u32,
}

impl AnthropicBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_max_tokens: u32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            default_max_tokens,
        })
    }

    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key environment variable
    /// is not set or the HTTP client cannot be constructed.
    pub fn new_from_config(config: &pageforge_config::Config) -> Result<Self, LlmError> {
        let api_key_env = config
            .llm
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV);

        let api_key = std::env::var(api_key_env).map_err(|_| {
            LlmError::Misconfiguration(format!(
                "Anthropic API key not found in environment variable '{api_key_env}'. \
                 Please set this variable or configure a different api_key_env in [llm]."
            ))
        })?;

        let model = config.llm.model.clone().ok_or_else(|| {
            LlmError::Misconfiguration(
                "Anthropic model not specified. Please set [llm] model = \"model-name\"."
                    .to_string(),
            )
        })?;

        Self::new(
            api_key,
            config.llm.base_url.clone(),
            model,
            config.llm.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        )
    }

    fn build_request(&self, inv: &LlmInvocation) -> AnthropicRequest {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        let max_tokens = inv
            .metadata
            .get("max_tokens")
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(self.default_max_tokens);

        let (system, messages) = convert_messages(&inv.messages);

        AnthropicRequest {
            model,
            messages,
            max_tokens,
            temperature: inv.temperature(),
            system,
        }
    }
}

/// Anthropic takes system prompts in a separate `system` field.
fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system_prompt: Option<String> = None;
    let mut converted = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => match system_prompt.as_mut() {
                Some(existing) => {
                    existing.push_str("\n\n");
                    existing.push_str(&msg.content);
                }
                None => system_prompt = Some(msg.content.clone()),
            },
            Role::User | Role::Assistant => converted.push(AnthropicMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            }),
        }
    }

    (system_prompt, converted)
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let body = self.build_request(&inv);

        debug!(
            provider = "anthropic",
            model = %body.model,
            stage = %inv.stage,
            max_tokens = body.max_tokens,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Anthropic backend"
        );

        let request = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let response = self
            .client
            .execute(request, inv.timeout, "anthropic")
            .await?;

        let parsed: AnthropicResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let content: String = parsed
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        if content.is_empty() {
            return Err(LlmError::EmptyResponse("anthropic".to_string()));
        }

        let usage = parsed.usage;
        Ok(LlmResult::new(content, "anthropic", body.model).with_tokens(
            usage.as_ref().map(|u| u.input_tokens),
            usage.as_ref().map(|u| u.output_tokens),
        ))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageforge_config::Config;
    use std::time::Duration;

    fn backend() -> AnthropicBackend {
        AnthropicBackend::new("key".to_string(), None, "claude-sonnet".to_string(), 1024).unwrap()
    }

    #[test]
    fn test_convert_messages_separates_system() {
        let (system, messages) = convert_messages(&[
            Message::system("one"),
            Message::user("hello"),
            Message::system("two"),
        ]);
        assert_eq!(system.as_deref(), Some("one\n\ntwo"));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn test_request_defaults_and_overrides() {
        let inv = LlmInvocation::new("run", "repair", "", Duration::from_secs(5), vec![
            Message::user("fix"),
        ]);
        let body = backend().build_request(&inv);
        assert_eq!(body.model, "claude-sonnet");
        assert_eq!(body.max_tokens, 1024);
        assert_eq!(body.temperature, None);

        let inv = inv
            .with_metadata("max_tokens", serde_json::json!(2000))
            .with_temperature(Some(0.3));
        let body = backend().build_request(&inv);
        assert_eq!(body.max_tokens, 2000);
        assert!(body.temperature.is_some());
    }

    #[test]
    fn test_response_text_blocks_are_joined() {
        let parsed: AnthropicResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"<footer>"},{"type":"tool_use"},{"type":"text","text":"</footer>"}],"usage":{"input_tokens":3,"output_tokens":4}}"#,
        )
        .unwrap();
        let joined: String = parsed
            .content
            .iter()
            .filter(|b| b.content_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        assert_eq!(joined, "<footer></footer>");
    }

    #[test]
    fn test_new_from_config_missing_api_key() {
        let mut config = Config::minimal_for_testing();
        config.llm.provider = Some("anthropic".to_string());
        config.llm.model = Some("claude-sonnet".to_string());
        config.llm.api_key_env = Some("PAGEFORGE_TEST_KEY_THAT_IS_NEVER_SET".to_string());

        match AnthropicBackend::new_from_config(&config) {
            Err(LlmError::Misconfiguration(msg)) => {
                assert!(msg.contains("PAGEFORGE_TEST_KEY_THAT_IS_NEVER_SET"));
            }
            Err(other) => panic!("expected Misconfiguration, got {other:?}"),
            Ok(_) => panic!("expected Misconfiguration, got a backend"),
        }
    }
}
