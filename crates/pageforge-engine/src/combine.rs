//! Combining parts into one document

use crate::part::PartContent;
use std::collections::BTreeMap;
use std::fmt;

const PREAMBLE: &str = "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>Generated page</title>\n\
</head>\n\
<body>\n";

const CLOSING: &str = "\n</body>\n</html>";

/// Generated parts of a run, keyed by index.
///
/// Threaded by value through the run; inserting an index again replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartSet {
    parts: BTreeMap<usize, String>,
}

impl PartSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_part(mut self, part: PartContent) -> Self {
        self.parts.insert(part.index, part.markup);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Whether every index in `1..=count` is present.
    #[must_use]
    pub fn is_complete(&self, count: usize) -> bool {
        (1..=count).all(|i| self.parts.contains_key(&i))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.parts.get(&index).map(String::as_str)
    }

    /// Parts in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.parts.iter().map(|(i, markup)| (*i, markup.as_str()))
    }
}

impl FromIterator<(usize, String)> for PartSet {
    fn from_iter<T: IntoIterator<Item = (usize, String)>>(iter: T) -> Self {
        Self {
            parts: iter.into_iter().collect(),
        }
    }
}

/// The single combined document of a run. Replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact(String);

impl Artifact {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wrap the parts, in ascending index order, in the document shell.
///
/// Completeness is the caller's responsibility.
#[must_use]
pub fn combine(parts: &PartSet) -> Artifact {
    let body = parts.iter().map(|(_, markup)| markup).collect::<Vec<_>>().join("\n");
    Artifact(format!("{PREAMBLE}{body}{CLOSING}"))
}
