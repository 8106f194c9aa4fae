use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `ForgeError` is the error returned by pageforge library operations. It provides:
/// - Detailed error information for programmatic handling
/// - User-friendly messages with context and suggestions
/// - Mapping to CLI exit codes for consistent error reporting
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Configuration file or CLI argument errors |
/// | `Llm` | Generation backend could not be constructed |
/// | `ExhaustedRetries` | A stage spent its whole attempt budget without a response |
/// | `Sink` | The finished artifact could not be persisted |
///
/// # Exit Code Mapping
///
/// Use [`to_exit_code()`](Self::to_exit_code) to map errors to CLI exit codes:
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration/CLI argument errors |
/// | 3 | Artifact sink failure |
/// | 10 | Last attempt of a stage timed out |
/// | 70 | Generation service failure |
/// | 1 | Other errors |
///
/// Library code returns `ForgeError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("{operation} failed after {attempts} attempt(s): {last_error}")]
    ExhaustedRetries {
        operation: String,
        attempts: u32,
        #[source]
        last_error: LlmError,
    },

    #[error("Goal must not be empty")]
    EmptyGoal,

    #[error("Failed to write artifact to {path}: {reason}")]
    Sink { path: String, reason: String },
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Generation,
    FileSystem,
    ResourceLimits,
    Input,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Generation => write!(f, "Generation"),
            Self::FileSystem => write!(f, "File System"),
            Self::ResourceLimits => write!(f, "Resource Limits"),
            Self::Input => write!(f, "Input"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("Configuration file is invalid: {msg}"),
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has an invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
            Self::DiscoveryFailed { reason } => {
                format!("Could not discover configuration: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => {
                Some("pageforge reads TOML from .pageforge/config.toml or --config.".to_string())
            }
            Self::InvalidValue { .. } => Some(
                "Values are resolved with precedence: CLI flags > config file > defaults."
                    .to_string(),
            ),
            Self::NotFound { .. } | Self::DiscoveryFailed { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of the configuration file".to_string(),
                "Remove unknown sections or keys".to_string(),
            ],
            Self::InvalidValue { key, .. } => vec![format!(
                "Correct the value of '{key}' in the configuration file or on the command line"
            )],
            Self::NotFound { .. } => vec![
                "Check the path passed to --config".to_string(),
                "Omit --config to use discovery and built-in defaults".to_string(),
            ],
            Self::DiscoveryFailed { .. } => {
                vec!["Pass an explicit configuration file with --config".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors that can occur during LLM backend operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure (connection refused, broken response body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Provider answered without any generated text
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {duration:?}")
            }
            Self::EmptyResponse(provider) => format!("{provider} returned an empty response"),
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => Some(
                "Transport errors occur when the generation service cannot be reached."
                    .to_string(),
            ),
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate missing or invalid API keys.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "Each attempt is bounded by the configured per-attempt timeout.".to_string(),
            ),
            Self::EmptyResponse(_) => None,
            Self::Misconfiguration(_) | Self::Unsupported(_) => Some(
                "Configuration errors indicate missing or invalid LLM provider settings."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) => vec![
                "Check that the generation service is running (e.g., 'ollama serve')".to_string(),
                "Verify [llm] base_url in the configuration".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Check that the required API key environment variable is set".to_string(),
                "Verify the API key is valid and not expired".to_string(),
            ],
            Self::ProviderQuota(_) | Self::ProviderOutage(_) => vec![
                "Wait a few minutes and try again".to_string(),
                "Increase [retry] max_attempts to ride out short disruptions".to_string(),
            ],
            Self::Timeout { .. } => vec![
                "Increase [retry] timeout_secs or pass --timeout-secs".to_string(),
                "Use a smaller or faster model".to_string(),
            ],
            Self::EmptyResponse(_) => vec!["Try a different model".to_string()],
            Self::Misconfiguration(_) | Self::Unsupported(_) => vec![
                "Check the [llm] section of .pageforge/config.toml".to_string(),
                "Supported providers: ollama, anthropic".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ProviderAuth(_) | Self::Misconfiguration(_) | Self::Unsupported(_) => {
                ErrorCategory::Configuration
            }
            Self::ProviderQuota(_) => ErrorCategory::ResourceLimits,
            Self::Transport(_)
            | Self::ProviderOutage(_)
            | Self::Timeout { .. }
            | Self::EmptyResponse(_) => ErrorCategory::Generation,
        }
    }
}

impl UserFriendlyError for ForgeError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Llm(err) => err.user_message(),
            Self::ExhaustedRetries {
                operation,
                attempts,
                last_error,
            } => format!(
                "{operation} did not succeed after {attempts} attempt(s); last error: {}",
                last_error.user_message()
            ),
            Self::EmptyGoal => "No goal was given; describe the page you want".to_string(),
            Self::Sink { path, reason } => format!("Could not save the page to {path}: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Llm(err) => err.context(),
            Self::ExhaustedRetries { last_error, .. } => Some(format!(
                "No partial page is written when a stage fails. {}",
                last_error.context().unwrap_or_default()
            )),
            Self::EmptyGoal => None,
            Self::Sink { .. } => {
                Some("The page was generated but could not be persisted.".to_string())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Llm(err) => err.suggestions(),
            Self::ExhaustedRetries { last_error, .. } => last_error.suggestions(),
            Self::EmptyGoal => vec!["pageforge generate \"a landing page for a bakery\"".to_string()],
            Self::Sink { .. } => vec![
                "Check that the output directory exists and is writable".to_string(),
                "Pass a different path with --output".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Llm(err) => err.category(),
            Self::ExhaustedRetries { .. } => ErrorCategory::Generation,
            Self::EmptyGoal => ErrorCategory::Input,
            Self::Sink { .. } => ErrorCategory::FileSystem,
        }
    }
}

impl ForgeError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// The format is:
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context().filter(|c| !c.trim().is_empty()) {
            output.push_str(&format!("\nContext: {}\n", ctx.trim()));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the appropriate CLI exit code.
    ///
    /// This is the single source of truth for CLI exit codes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pageforge_utils::error::{ForgeError, ConfigError};
    /// use pageforge_utils::exit_codes::ExitCode;
    ///
    /// let err = ForgeError::Config(ConfigError::InvalidFile("bad".to_string()));
    /// assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
    /// ```
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            ForgeError::Config(_) | ForgeError::EmptyGoal => ExitCode::CLI_ARGS,
            ForgeError::Llm(LlmError::Misconfiguration(_) | LlmError::Unsupported(_)) => {
                ExitCode::CLI_ARGS
            }
            ForgeError::Llm(_) => ExitCode::GENERATION_FAILURE,
            ForgeError::ExhaustedRetries { last_error, .. } => match last_error {
                LlmError::Timeout { .. } => ExitCode::STAGE_TIMEOUT,
                _ => ExitCode::GENERATION_FAILURE,
            },
            ForgeError::Sink { .. } => ExitCode::SINK_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::ExitCode;

    #[test]
    fn test_exhausted_retries_message_names_operation_and_cause() {
        let err = ForgeError::ExhaustedRetries {
            operation: "generate part 3".to_string(),
            attempts: 5,
            last_error: LlmError::Transport("connection refused".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("generate part 3"));
        assert!(msg.contains("5 attempt(s)"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_exit_code_mapping() {
        let timeout = ForgeError::ExhaustedRetries {
            operation: "plan".to_string(),
            attempts: 2,
            last_error: LlmError::Timeout {
                duration: Duration::from_secs(1),
            },
        };
        assert_eq!(timeout.to_exit_code(), ExitCode::STAGE_TIMEOUT);

        let outage = ForgeError::ExhaustedRetries {
            operation: "plan".to_string(),
            attempts: 2,
            last_error: LlmError::ProviderOutage("503".to_string()),
        };
        assert_eq!(outage.to_exit_code(), ExitCode::GENERATION_FAILURE);

        assert_eq!(ForgeError::EmptyGoal.to_exit_code(), ExitCode::CLI_ARGS);
        assert_eq!(
            ForgeError::Llm(LlmError::Unsupported("x".to_string())).to_exit_code(),
            ExitCode::CLI_ARGS
        );
        assert_eq!(
            ForgeError::Sink {
                path: "out.html".to_string(),
                reason: "denied".to_string()
            }
            .to_exit_code(),
            ExitCode::SINK_FAILURE
        );
    }

    #[test]
    fn test_display_for_user_has_sections() {
        let err = ForgeError::ExhaustedRetries {
            operation: "validate artifact".to_string(),
            attempts: 3,
            last_error: LlmError::Transport("connection refused".to_string()),
        };
        let rendered = err.display_for_user();
        assert!(rendered.starts_with("Error: "));
        assert!(rendered.contains("Context:"));
        assert!(rendered.contains("Suggestions:"));
        assert!(rendered.contains("ollama serve"));
    }

    #[test]
    fn test_every_forge_error_is_reachable_and_fails_the_run() {
        let errors = [
            ForgeError::Config(ConfigError::InvalidFile("bad".to_string())),
            ForgeError::Llm(LlmError::Misconfiguration("no key".to_string())),
            ForgeError::ExhaustedRetries {
                operation: "part 1".to_string(),
                attempts: 1,
                last_error: LlmError::Transport("refused".to_string()),
            },
            ForgeError::EmptyGoal,
            ForgeError::Sink {
                path: "out.html".to_string(),
                reason: "read-only".to_string(),
            },
        ];
        for err in &errors {
            // Exhaustive on purpose: a new variant must be added above.
            let expected = match err {
                ForgeError::Config(_) | ForgeError::EmptyGoal => ExitCode::CLI_ARGS,
                ForgeError::Llm(LlmError::Misconfiguration(_)) => ExitCode::CLI_ARGS,
                ForgeError::Llm(_) | ForgeError::ExhaustedRetries { .. } => {
                    ExitCode::GENERATION_FAILURE
                }
                ForgeError::Sink { .. } => ExitCode::SINK_FAILURE,
            };
            assert_eq!(err.to_exit_code(), expected, "{err:?}");
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(ForgeError::EmptyGoal.category(), ErrorCategory::Input);
        assert_eq!(
            LlmError::ProviderQuota("429".to_string()).category(),
            ErrorCategory::ResourceLimits
        );
        assert_eq!(
            ConfigError::NotFound {
                path: "x.toml".to_string()
            }
            .category(),
            ErrorCategory::Configuration
        );
    }
}
