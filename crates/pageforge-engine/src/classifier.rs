//! Goal classification
//!
//! Maps a free-text goal to a coarse [`TaskCategory`] by keyword matching.
//! The category only colours the planning prompt; it never changes control
//! flow.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Landing,
    Dashboard,
    Content,
    Commerce,
    Portfolio,
    General,
}

/// Categories in matching priority order, each with its keywords.
const KEYWORDS: [(TaskCategory, &[&str]); 5] = [
    (TaskCategory::Landing, &["landing", "homepage", "home page"]),
    (TaskCategory::Dashboard, &["dashboard", "admin", "panel"]),
    (TaskCategory::Content, &["blog", "article", "post"]),
    (TaskCategory::Commerce, &["ecommerce", "shop", "store", "product"]),
    (TaskCategory::Portfolio, &["portfolio", "gallery", "showcase"]),
];

impl TaskCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Dashboard => "dashboard",
            Self::Content => "content",
            Self::Commerce => "commerce",
            Self::Portfolio => "portfolio",
            Self::General => "general",
        }
    }

    /// One-sentence planning guidance for this kind of page.
    #[must_use]
    pub const fn guidance(&self) -> &'static str {
        match self {
            Self::Landing => {
                "This is a landing/homepage - focus on strong hero section, clear value proposition, and conversion elements."
            }
            Self::Dashboard => {
                "This is a dashboard/admin interface - focus on data visualization, navigation, and utility components."
            }
            Self::Content => {
                "This is a content/blog page - focus on readability, typography, and content organization."
            }
            Self::Commerce => {
                "This is an e-commerce page - focus on product display, shopping cart, and conversion optimization."
            }
            Self::Portfolio => {
                "This is a portfolio/gallery page - focus on visual presentation and media display."
            }
            Self::General => {
                "This is a general web page - ensure balanced structure with clear navigation and content organization."
            }
        }
    }

    /// Short tag naming what the plan should prioritise.
    #[must_use]
    pub const fn priority(&self) -> &'static str {
        match self {
            Self::Landing => "hero_and_cta",
            Self::Dashboard => "navigation_and_data",
            Self::Content => "content_and_readability",
            Self::Commerce => "products_and_checkout",
            Self::Portfolio => "visuals_and_media",
            Self::General => "balanced_structure",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a goal. The first category with a keyword contained in the
/// lower-cased goal wins; no match yields `General`.
#[must_use]
pub fn classify(goal: &str) -> TaskCategory {
    let goal = goal.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| goal.contains(w)))
        .map_or(TaskCategory::General, |(category, _)| *category)
}
