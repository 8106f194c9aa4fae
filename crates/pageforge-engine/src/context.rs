//! Per-part context extraction
//!
//! A best-effort focusing aid: lines of the plan that mention a part's
//! vocabulary are collected together with their neighbours. It never fails.

use crate::plan::Plan;

/// Most lines a context may carry.
pub const MAX_CONTEXT_LINES: usize = 15;

/// Lines kept before a matching line.
const LINES_BEFORE: usize = 1;
/// Lines kept after a matching line.
const LINES_AFTER: usize = 4;

/// Excerpt of the plan for one part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartContext {
    pub index: usize,
    pub text: String,
    /// False when no plan line matched and `text` is the generic instruction.
    pub matched: bool,
}

fn keywords(index: usize) -> &'static [&'static str] {
    match index {
        1 => &["part 1", "header", "navigation", "logo", "menu"],
        2 => &[
            "part 2",
            "hero",
            "main content",
            "main",
            "primary",
            "call-to-action",
        ],
        3 => &[
            "part 3",
            "feature",
            "content blocks",
            "secondary",
            "highlights",
        ],
        4 => &["part 4", "sidebar", "supporting", "widget", "related"],
        5 => &["part 5", "footer", "final", "contact", "legal", "social"],
        _ => &[],
    }
}

/// Extract the context for part `index` from `plan`.
#[must_use]
pub fn extract(plan: &Plan, index: usize) -> PartContext {
    extract_from_text(plan.text(), index)
}

/// Same as [`extract`], over raw plan text.
#[must_use]
pub fn extract_from_text(plan: &str, index: usize) -> PartContext {
    let words = keywords(index);
    let lines: Vec<&str> = plan.lines().collect();
    let mut collected: Vec<&str> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if collected.len() >= MAX_CONTEXT_LINES {
            break;
        }
        let lower = line.to_lowercase();
        if words.iter().any(|w| lower.contains(w)) {
            let start = i.saturating_sub(LINES_BEFORE);
            let end = (i + LINES_AFTER + 1).min(lines.len());
            collected.extend_from_slice(&lines[start..end]);
        }
    }
    collected.truncate(MAX_CONTEXT_LINES);

    if collected.is_empty() {
        return PartContext {
            index,
            text: format!("Part {index} component based on the overall plan structure."),
            matched: false,
        };
    }

    PartContext {
        index,
        text: collected.join("\n"),
        matched: true,
    }
}
