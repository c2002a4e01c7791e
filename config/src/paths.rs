//! Filesystem path conventions of the project

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ARTIFACTS_PATH, DEFAULT_CACHE_PATH, DEFAULT_SOURCES_PATH, DEFAULT_TESTS_PATH,
};

/// Where the project keeps its sources, tests, cache and build artifacts.
///
/// Relative paths are interpreted relative to the directory containing the
/// configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Contract sources
    pub sources: PathBuf,
    /// Contract tests
    pub tests: PathBuf,
    /// Compilation cache
    pub cache: PathBuf,
    /// Compilation artifacts
    pub artifacts: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources: PathBuf::from(DEFAULT_SOURCES_PATH),
            tests: PathBuf::from(DEFAULT_TESTS_PATH),
            cache: PathBuf::from(DEFAULT_CACHE_PATH),
            artifacts: PathBuf::from(DEFAULT_ARTIFACTS_PATH),
        }
    }
}

impl PathsConfig {
    /// Anchor every relative path at `root`
    pub fn resolve(&self, root: &Path) -> Self {
        let anchor = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p.strip_prefix(".").unwrap_or(p))
            }
        };

        Self {
            sources: anchor(&self.sources),
            tests: anchor(&self.tests),
            cache: anchor(&self.cache),
            artifacts: anchor(&self.artifacts),
        }
    }

    /// The artifact file for `contract`, compiled from `source_name`
    /// (a path relative to the project root, e.g. `contracts/Xenrena.sol`)
    pub fn artifact_path(&self, source_name: &str, contract: &str) -> PathBuf {
        self.artifacts
            .join(source_name)
            .join(format!("{contract}.json"))
    }
}
