//! Prompt text for each stage
//!
//! Kept apart from the control flow so stages can be read without wading
//! through prose.

use crate::classifier::TaskCategory;
use crate::plan::SECTION_COUNT;

pub(crate) fn plan_prompt(goal: &str, category: TaskCategory) -> String {
    format!(
        "You are a senior web architect. Write a structural plan for this page: {goal}\n\n\
         Context: {guidance} (priority: {priority})\n\n\
         The plan must contain exactly {SECTION_COUNT} sections, each starting with its label \
         on its own line:\n\
         PART 1: HEADER & NAVIGATION - branding, menu structure, search, account controls\n\
         PART 2: HERO SECTION / MAIN CONTENT AREA - primary layout, key visuals, calls to action\n\
         PART 3: FEATURE SECTIONS / CONTENT BLOCKS - secondary content, highlights, interactive elements\n\
         PART 4: SIDEBAR / SUPPORTING CONTENT - secondary navigation, related content, widgets\n\
         PART 5: FOOTER & FINAL ELEMENTS - footer layout, contact details, legal and social links\n\n\
         Under each label list the concrete components as short bullet points.\n\
         Describe structure only. Do not write any HTML, CSS or code, and do not use code fences.",
        guidance = category.guidance(),
        priority = category.priority(),
    )
}

/// Layout hint for one part of the page.
pub(crate) fn style_hint(index: usize) -> &'static str {
    match index {
        1 => {
            "Sticky header with a translucent background and backdrop blur; \
             search as a flex item with max-width 640px; icons sized 24px."
        }
        2 => {
            "Card grid using grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); \
             cards with 12px border radius; on hover scale(1.02) and a soft shadow."
        }
        3 => {
            "Media cards with images at aspect-ratio 16/9 and object-fit: cover; \
             meta row as flex with 12px gap; titles clamped to 2 lines."
        }
        4 => {
            "Sidebar 240px wide with a right border and overflow-y: auto; \
             items padded 10px 24px with a distinct active state."
        }
        5 => {
            "Footer grid using repeat(auto-fit, minmax(200px, 1fr)) with 24px gap; \
             links in the secondary text colour at 14px."
        }
        _ => "Balanced layout consistent with the rest of the page.",
    }
}

pub(crate) fn part_prompt(index: usize, goal: &str, plan: &str, context: &str) -> String {
    format!(
        "Build PART {index} of {SECTION_COUNT} for this page: {goal}\n\n\
         FOCUS FOR THIS PART:\n{context}\n\n\
         FULL PLAN (for consistency only, build just PART {index}):\n{plan}\n\n\
         LAYOUT HINT: {hint}\n\n\
         REQUIREMENTS:\n\
         - Semantic HTML5 elements (header, nav, main, section, article, aside, footer)\n\
         - Put the component's CSS in a <style> element inside the component\n\
         - Layout with CSS Grid or Flexbox, mobile-first with min-width media queries\n\
         - CSS custom properties for colours and spacing, rem units for sizing\n\
         - BEM class names\n\
         - Transitions, hover states and visible focus states\n\
         - ARIA labels and roles where they help, sufficient colour contrast\n\
         - No JavaScript\n\n\
         OUTPUT: only the HTML for this part. No markdown code fences, no explanations. \
         Start directly with an opening tag.",
        hint = style_hint(index),
    )
}

pub(crate) fn validation_prompt(artifact: &str) -> String {
    format!(
        "Act as a Senior Web Developer. Review the following HTML code for errors.\n\
         If the code is valid, respond with exactly: \"VALID\".\n\
         If there are errors (unclosed tags, broken structure, invalid CSS), respond with \
         \"ERROR:\" followed by a brief instruction on how to fix it.\n\n\
         CODE TO REVIEW:\n{artifact}"
    )
}

pub(crate) fn repair_prompt(artifact: &str, feedback: &str) -> String {
    format!("Fix this HTML based on this feedback: {feedback}\n\nHTML:\n{artifact}")
}
