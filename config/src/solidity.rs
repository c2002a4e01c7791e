//! Solidity compiler settings

use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_OPTIMIZER_RUNS, DEFAULT_SOLC_VERSION},
    errors::ConfigError,
};

/// The compiler version and settings used to build the contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolidityConfig {
    /// The exact `solc` version, e.g. `0.8.19`
    pub version: String,
    /// Optimizer settings passed to `solc`
    pub optimizer: OptimizerConfig,
}

/// Settings for the `solc` optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Whether the optimizer is enabled
    pub enabled: bool,
    /// How many times the deployed code is expected to run over its lifetime
    pub runs: u32,
}

impl Default for SolidityConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_SOLC_VERSION.to_string(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            runs: DEFAULT_OPTIMIZER_RUNS,
        }
    }
}

impl SolidityConfig {
    /// Checks that the version is a plain `MAJOR.MINOR.PATCH` triple and that
    /// an enabled optimizer has a positive run count
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parts: Vec<&str> = self.version.split('.').collect();
        let well_formed = parts.len() == 3
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

        if !well_formed {
            return Err(ConfigError::InvalidValue {
                field: "solidity.version".to_string(),
                reason: format!("expected MAJOR.MINOR.PATCH, got `{}`", self.version),
            });
        }

        if self.optimizer.enabled && self.optimizer.runs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "solidity.optimizer.runs".to_string(),
                reason: "must be positive when the optimizer is enabled".to_string(),
            });
        }

        Ok(())
    }

    /// The `solc` command line flags for these optimizer settings
    pub fn optimizer_args(&self) -> Vec<String> {
        if self.optimizer.enabled {
            vec![
                "--optimize".to_string(),
                "--optimize-runs".to_string(),
                self.optimizer.runs.to_string(),
            ]
        } else {
            Vec::new()
        }
    }
}
