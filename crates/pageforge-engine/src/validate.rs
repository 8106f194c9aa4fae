//! Artifact validation by the generation service

use crate::client::StageClient;
use crate::combine::Artifact;
use crate::prompts;
use pageforge_utils::error::ForgeError;
use pageforge_utils::types::StageId;
use serde::Serialize;

/// The validator's judgement of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "feedback", rename_all = "lowercase")]
pub enum Verdict {
    Valid,
    /// Opaque corrective guidance from the reviewer.
    Invalid(String),
}

impl Verdict {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Read a reviewer response. Any mention of "error", in any case, makes the
/// verdict `Invalid` with the whole trimmed response as feedback.
///
/// This is the only place raw review text is inspected.
#[must_use]
pub fn parse_verdict(response: &str) -> Verdict {
    if response.to_uppercase().contains("ERROR") {
        Verdict::Invalid(response.trim().to_string())
    } else {
        Verdict::Valid
    }
}

pub struct Validator<'a> {
    client: &'a StageClient,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub fn new(client: &'a StageClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns `ForgeError::ExhaustedRetries` when the reviewer never answered.
    pub async fn validate(&self, artifact: &Artifact) -> Result<Verdict, ForgeError> {
        let response = self
            .client
            .complete(
                StageId::Validate,
                StageId::Validate.as_str(),
                prompts::validation_prompt(artifact.as_str()),
            )
            .await?;
        Ok(parse_verdict(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_verdict() {
        assert_eq!(parse_verdict("VALID"), Verdict::Valid);
        assert_eq!(parse_verdict("  valid.\n"), Verdict::Valid);
        assert_eq!(
            parse_verdict("ERROR: missing closing tag\n"),
            Verdict::Invalid("ERROR: missing closing tag".to_string())
        );
        // Any mention counts, wherever it appears.
        assert!(!parse_verdict("Looks fine, no errors found").is_valid());
        assert!(!parse_verdict("error: lowercase").is_valid());
    }

    #[test]
    fn test_verdict_serializes_tagged() {
        let json = serde_json::to_value(Verdict::Invalid("fix".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"verdict": "invalid", "feedback": "fix"}));
        let json = serde_json::to_value(Verdict::Valid).unwrap();
        assert_eq!(json, serde_json::json!({"verdict": "valid"}));
    }

    proptest! {
        #[test]
        fn prop_verdict_follows_error_mention(
            before in "[a-zA-Z .:\n]{0,30}",
            marker in "[eE][rR][rR][oO][rR]",
            after in "[a-zA-Z .:\n]{0,30}",
        ) {
            let with_marker = format!("{before}{marker}{after}");
            prop_assert_eq!(
                parse_verdict(&with_marker),
                Verdict::Invalid(with_marker.trim().to_string())
            );
        }

        #[test]
        fn prop_text_without_error_is_valid(text in "[a-dfhj-zA-DFHJ-Z .:!\n]{0,60}") {
            prop_assert_eq!(parse_verdict(&text), Verdict::Valid);
        }
    }
}
