//! Run configuration
//!
//! Loaded from a `classlint.toml` file when present, then overridden by
//! command-line arguments in `main`.

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default file names probed in the project root.
const CONFIG_FILE_NAMES: &[&str] = &["classlint.toml", ".classlint.toml"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Defects ranked less severe than this are dropped (1 = most severe,
    /// 20 = least; 20 reports everything).
    pub rank_threshold: u8,
    /// Emit per-annotation detail for each defect.
    pub long_report: bool,
    /// Pattern expressions a defect must match to be reported. Empty
    /// means no include filtering.
    pub include: Vec<String>,
    /// Pattern expressions that drop matching defects.
    pub exclude: Vec<String>,
    /// Detector ids to force-enable; a non-empty list is exclusive.
    pub enable: Vec<String>,
    /// Detector ids to disable. Wins over `enable`.
    pub disable: Vec<String>,
    /// Report destination; stdout when unset.
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rank_threshold: crate::defect::RANK_LEAST_SEVERE,
            long_report: false,
            include: Vec::new(),
            exclude: Vec::new(),
            enable: Vec::new(),
            disable: Vec::new(),
            output: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to parse config file {}", path.display()))
    }

    /// Probe the default config locations under `root`; fall back to the
    /// built-in defaults when none exists.
    pub fn from_default_locations(root: &Path) -> Result<Self> {
        for name in CONFIG_FILE_NAMES {
            let candidate = root.join(name);
            if candidate.is_file() {
                debug!("Loading config from {}", candidate.display());
                return Self::from_file(&candidate);
            }
        }
        Ok(Self::default())
    }
}
