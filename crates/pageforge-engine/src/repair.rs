//! Whole-document repair

use crate::client::StageClient;
use crate::combine::Artifact;
use crate::prompts;
use pageforge_utils::error::ForgeError;
use pageforge_utils::types::StageId;

pub struct Repairer<'a> {
    client: &'a StageClient,
}

impl<'a> Repairer<'a> {
    #[must_use]
    pub fn new(client: &'a StageClient) -> Self {
        Self { client }
    }

    /// Ask for a corrected document. The response replaces the artifact as is.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::ExhaustedRetries` when the service never answered.
    pub async fn repair(&self, artifact: &Artifact, feedback: &str) -> Result<Artifact, ForgeError> {
        let repaired = self
            .client
            .complete(
                StageId::Repair,
                StageId::Repair.as_str(),
                prompts::repair_prompt(artifact.as_str(), feedback),
            )
            .await?;
        Ok(Artifact::new(repaired))
    }
}
