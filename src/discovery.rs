//! Model file discovery
//!
//! Walks the target directory for `*.json` class-model files. Results are
//! sorted so a run over the same tree always sees the same input order.

use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Finds class-model files under a project root.
#[derive(Debug, Default)]
pub struct ModelFinder;

impl ModelFinder {
    pub fn new() -> Self {
        Self
    }

    pub fn find_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.into_diagnostic()?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        debug!("Discovered {} model files under {}", files.len(), root.display());
        Ok(files)
    }
}
