//! Atomic file writes
//!
//! Content goes to a temporary file in the target directory, is fsynced, and
//! is then renamed over the target. Readers never observe a half-written page.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `content` to `path` using temp file + fsync + rename.
///
/// Line endings are normalized to LF and missing parent directories are
/// created. Returns the number of bytes written.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<usize> {
    let normalized = normalize_line_endings(content);

    let temp_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(temp_dir)
        .with_context(|| format!("Failed to create parent directory: {}", temp_dir.display()))?;

    let mut temp_file = NamedTempFile::new_in(temp_dir)
        .with_context(|| format!("Failed to create temporary file in: {}", temp_dir.display()))?;

    temp_file
        .write_all(normalized.as_bytes())
        .with_context(|| "Failed to write content to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync temporary file")?;

    temp_file
        .persist(path)
        .map_err(|e| anyhow::anyhow!(e.error))
        .with_context(|| format!("Failed to atomically write file: {}", path.display()))?;

    Ok(normalized.len())
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}
