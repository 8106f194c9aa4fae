//! Artifact persistence
//!
//! The engine hands the finished artifact to an [`ArtifactSink`] once a run
//! reaches `Done`. Nothing is handed over when a run fails.

use crate::combine::Artifact;
use pageforge_utils::atomic_write::write_file_atomic;
use pageforge_utils::error::ForgeError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

pub trait ArtifactSink: Send + Sync {
    /// Persist the artifact, returning a description of where it went.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::Sink` when the artifact could not be stored.
    fn persist(&self, artifact: &Artifact) -> Result<String, ForgeError>;
}

/// Writes the page to a file, atomically.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Remove stray code-fence markers a repair may have left around the page.
#[must_use]
pub fn strip_fence_markers(text: &str) -> String {
    text.replace("```html", "").replace("```", "")
}

impl ArtifactSink for FileSink {
    fn persist(&self, artifact: &Artifact) -> Result<String, ForgeError> {
        let content = strip_fence_markers(artifact.as_str());
        let bytes = write_file_atomic(&self.path, &content).map_err(|e| ForgeError::Sink {
            path: self.path.display().to_string(),
            reason: format!("{e:#}"),
        })?;
        info!(path = %self.path.display(), bytes, "Page written");
        Ok(self.path.display().to_string())
    }
}

/// Keeps persisted artifacts in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    stored: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stored(&self) -> Vec<String> {
        self.stored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ArtifactSink for MemorySink {
    fn persist(&self, artifact: &Artifact) -> Result<String, ForgeError> {
        let mut stored = self
            .stored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        stored.push(artifact.as_str().to_string());
        Ok(format!("memory #{}", stored.len()))
    }
}
