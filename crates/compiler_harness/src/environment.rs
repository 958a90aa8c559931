//! Where fixtures live and what they are called.
//!
//! Resolved once from the [HarnessConfig] and then shared, read-only, by every subject's run.
use std::path::PathBuf;

use crate::harness_config::HarnessConfig;

#[derive(Clone, Debug)]
pub struct Environment {
    pub fixtures_dir: PathBuf,
    pub interop_dir: PathBuf,
    pub source_extension: String,
    pub golden_extension: String,
    pub interop_suffix: String,
    pub smoke_source: String,
}

/// The configuration file used when none is given on the command line.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("harness.yaml")
}

impl Environment {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            fixtures_dir: config.resolve(&config.fixtures_dir),
            interop_dir: config.resolve(&config.interop_dir),
            source_extension: config.source_extension.clone(),
            golden_extension: config.golden_extension.clone(),
            interop_suffix: config.interop_suffix.clone(),
            smoke_source: config
                .smoke_source
                .clone()
                .unwrap_or_else(|| crate::suites::smoke::SMOKE_SOURCE.to_string()),
        }
    }

    /// An environment rooted at `root`, with every other setting at its default.
    #[cfg(test)]
    pub fn rooted_at(root: &std::path::Path) -> Self {
        Self {
            fixtures_dir: root.join("fixtures"),
            interop_dir: root.join("interop"),
            source_extension: "ts".to_string(),
            golden_extension: "wat".to_string(),
            interop_suffix: "test".to_string(),
            smoke_source: crate::suites::smoke::SMOKE_SOURCE.to_string(),
        }
    }
}
