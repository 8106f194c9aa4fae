//! Part generation and output normalization

use crate::client::StageClient;
use crate::context;
use crate::plan::Plan;
use crate::prompts;
use once_cell::sync::Lazy;
use pageforge_utils::error::ForgeError;
use pageforge_utils::types::StageId;
use regex::Regex;
use tracing::debug;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```[a-z0-9_+-]*\s*").expect("valid regex literal"));

static PREAMBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:here['’]s|here is|the code|code for)[^:\n]*:\s*")
        .expect("valid regex literal")
});

static OPENING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex literal"));

/// Normalized markup for one part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartContent {
    pub index: usize,
    pub markup: String,
}

/// Clean raw service output into part markup.
///
/// Removes every code-fence marker, strips leading "Here's ...:" style
/// preambles, trims, and drops anything before the first tag. Applying it
/// twice gives the same result as applying it once.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let next = FENCE.replace_all(&text, "").into_owned();
        if next == text {
            break;
        }
        text = next;
    }

    let mut text = text.trim().to_string();
    loop {
        let next = PREAMBLE.replace(&text, "").trim().to_string();
        if next == text {
            break;
        }
        text = next;
    }

    if !text.starts_with('<')
        && let Some(tag) = OPENING_TAG.find(&text)
    {
        text = text[tag.start()..].to_string();
    }
    text
}

/// Generates one part of the page at a time.
pub struct PartGenerator<'a> {
    client: &'a StageClient,
}

impl<'a> PartGenerator<'a> {
    #[must_use]
    pub fn new(client: &'a StageClient) -> Self {
        Self { client }
    }

    /// Generate part `index` of `plan`.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::ExhaustedRetries` labelled `part <index>` when
    /// the service never answered.
    pub async fn generate(
        &self,
        index: usize,
        plan: &Plan,
        goal: &str,
    ) -> Result<PartContent, ForgeError> {
        let ctx = context::extract(plan, index);
        debug!(
            index,
            matched = ctx.matched,
            context_lines = ctx.text.lines().count(),
            "Extracted part context"
        );

        let prompt = prompts::part_prompt(index, goal, plan.text(), &ctx.text);
        let operation = format!("part {index}");
        let raw = self
            .client
            .complete(StageId::Part, &operation, prompt)
            .await?;

        Ok(PartContent {
            index,
            markup: normalize(&raw),
        })
    }
}
