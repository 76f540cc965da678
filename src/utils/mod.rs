//! Small filesystem helpers.

use anyhow::{Context, Result};
use std::path::Path;

/// Create a directory (and parents) if it does not exist.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}
