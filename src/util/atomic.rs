//! Atomic file writing via tempfile + rename.
//!
//! Patched files are written to a temporary file next to the target and then
//! persisted over it, so an interrupted run never leaves a half-written
//! build file behind.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Atomically replace the contents of `path` with `content`.
///
/// # Errors
///
/// Returns an error if the parent directory doesn't exist, writing fails,
/// or the rename fails (e.g., cross-device).
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;

    tmp.write_all(content.as_bytes())
        .with_context(|| format!("failed to write patched content for {}", path.display()))?;

    tmp.flush()
        .with_context(|| format!("failed to flush patched content for {}", path.display()))?;

    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    Ok(())
}
