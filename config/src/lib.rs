//! Project configuration for building and deploying the Xenrena contracts.
//!
//! The configuration is a TOML file (by default `xenrena.toml`) describing the
//! Solidity compiler settings, the networks the contracts can be deployed to,
//! the named accounts and the project's path conventions. Every section is
//! optional; omitted sections take the defaults returned by
//! [`ProjectConfig::default`].
//!
//! ```toml
//! [solidity]
//! version = "0.8.19"
//! optimizer = { enabled = true, runs = 200 }
//!
//! [networks.alchemy]
//! url = "${ALCHEMY_URL}"
//! accounts = ["${PRIVATE_KEY}"]
//!
//! [named_accounts]
//! deployer = 0
//! user = 1
//! ```
//!
//! Network values may reference environment variables as `${NAME}`. They are
//! substituted only when a network is resolved, so a missing variable is an
//! error for the network that needs it and for no other.

#![deny(missing_docs)]

pub mod constants;
pub mod errors;
pub mod network;
pub mod paths;
pub mod solidity;

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use errors::ConfigError;
pub use network::{NetworkConfig, ResolvedNetwork};
pub use paths::PathsConfig;
pub use solidity::{OptimizerConfig, SolidityConfig};

use constants::{
    ALCHEMY_NETWORK, DEPLOYER_ACCOUNT, DOTENV_FILE, LOCAL_NETWORK, MUMBAI_NETWORK, USER_ACCOUNT,
};

/// The full project configuration, read once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Compiler version and optimizer settings
    pub solidity: SolidityConfig,
    /// The networks the contracts can be deployed to, by name
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Role names mapped onto indices into a network's account list
    pub named_accounts: BTreeMap<String, usize>,
    /// Filesystem path conventions
    pub paths: PathsConfig,
    /// The directory the configuration was loaded from
    #[serde(skip)]
    pub root: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        let networks = BTreeMap::from([
            (LOCAL_NETWORK.to_string(), NetworkConfig::local()),
            (MUMBAI_NETWORK.to_string(), NetworkConfig::mumbai()),
            (ALCHEMY_NETWORK.to_string(), NetworkConfig::alchemy()),
        ]);
        let named_accounts = BTreeMap::from([
            (DEPLOYER_ACCOUNT.to_string(), 0),
            (USER_ACCOUNT.to_string(), 1),
        ]);

        Self {
            solidity: SolidityConfig::default(),
            networks,
            named_accounts,
            paths: PathsConfig::default(),
            root: PathBuf::from("."),
        }
    }
}

impl ProjectConfig {
    /// Parse a configuration from TOML source, rooted at `root`
    pub fn from_toml(source: &str, root: &Path) -> Result<Self, ConfigError> {
        let mut config: ProjectConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config
            .networks
            .entry(LOCAL_NETWORK.to_string())
            .or_insert_with(NetworkConfig::local);
        config.root = root.to_path_buf();

        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file at `path`.
    ///
    /// Environment variables must already be set; see
    /// [`ProjectConfig::load_with_dotenv`] for `.env` support.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        debug!("loaded configuration from {}", path.display());
        Self::from_toml(&source, &root)
    }

    /// Load the `.env` file next to the configuration file (falling back to
    /// the working directory), then the configuration itself.
    ///
    /// Variables already present in the environment take precedence over the
    /// `.env` file.
    pub fn load_with_dotenv(path: &Path) -> Result<Self, ConfigError> {
        let env_path = path
            .parent()
            .map(|dir| dir.join(DOTENV_FILE))
            .filter(|p| p.exists());

        match env_path {
            Some(env_path) => {
                dotenvy::from_path(&env_path)
                    .map_err(|e| ConfigError::Read(format!("{}: {}", env_path.display(), e)))?;
                debug!("loaded environment from {}", env_path.display());
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }

        Self::load(path)
    }

    /// Like [`ProjectConfig::load_with_dotenv`], but falls back to the
    /// built-in defaults when there is no file at `path`
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load_with_dotenv(path);
        }

        warn!(
            "no configuration at {}, using the built-in defaults",
            path.display()
        );
        dotenvy::dotenv().ok();
        Ok(Self::default())
    }

    /// Check the invariants that do not depend on the environment
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solidity.validate()?;

        for (name, network) in &self.networks {
            if network.url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("networks.{name}.url"),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// The declared configuration of the network `name`
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))
    }

    /// Resolve the network `name` against the process environment
    pub fn resolve_network(&self, name: &str) -> Result<ResolvedNetwork, ConfigError> {
        self.resolve_network_with(name, |var| std::env::var(var).ok())
    }

    /// Resolve the network `name`, looking environment variables up with `lookup`
    pub fn resolve_network_with<F>(
        &self,
        name: &str,
        lookup: F,
    ) -> Result<ResolvedNetwork, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.network(name)?.resolve(name, lookup)
    }

    /// The account index the named account `name` maps to
    pub fn named_account_index(&self, name: &str) -> Result<usize, ConfigError> {
        self.named_accounts
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownNamedAccount(name.to_string()))
    }

    /// The path conventions, anchored at the configuration's directory
    pub fn paths(&self) -> PathsConfig {
        self.paths.resolve(&self.root)
    }
}
