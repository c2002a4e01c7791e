//! Network definitions and their resolution against the environment

use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        ALCHEMY_URL_ENV_VAR, LOCAL_DEV_KEYS, LOCAL_RPC_URL, MUMBAI_RPC_URL, PRIVATE_KEY_ENV_VAR,
    },
    errors::ConfigError,
};

/// A network as declared in the configuration file.
///
/// Any string value may reference environment variables as `${NAME}`; the
/// references are substituted when the network is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL
    pub url: String,
    /// Hex-encoded private keys of the signing accounts, in index order
    pub accounts: Vec<String>,
    /// The expected chain ID, checked against the node when set
    pub chain_id: Option<u64>,
}

/// A network with every environment reference substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNetwork {
    /// The name the network is declared under
    pub name: String,
    /// JSON-RPC endpoint URL
    pub url: String,
    /// Hex-encoded private keys of the signing accounts, in index order
    pub accounts: Vec<String>,
    /// The expected chain ID, if declared
    pub chain_id: Option<u64>,
}

impl NetworkConfig {
    /// The local development node, funded with the well-known dev accounts
    pub fn local() -> Self {
        Self {
            url: LOCAL_RPC_URL.to_string(),
            accounts: LOCAL_DEV_KEYS.iter().map(|k| k.to_string()).collect(),
            chain_id: None,
        }
    }

    /// The Polygon Mumbai testnet, signing with `${PRIVATE_KEY}`
    pub fn mumbai() -> Self {
        Self {
            url: MUMBAI_RPC_URL.to_string(),
            accounts: vec![env_ref(PRIVATE_KEY_ENV_VAR)],
            chain_id: None,
        }
    }

    /// A network reached through `${ALCHEMY_URL}`, signing with `${PRIVATE_KEY}`
    pub fn alchemy() -> Self {
        Self {
            url: env_ref(ALCHEMY_URL_ENV_VAR),
            accounts: vec![env_ref(PRIVATE_KEY_ENV_VAR)],
            chain_id: None,
        }
    }

    /// Substitute environment references using `lookup`.
    ///
    /// A variable that `lookup` does not know, or maps to an empty string,
    /// is reported as missing.
    pub fn resolve<F>(&self, name: &str, lookup: F) -> Result<ResolvedNetwork, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing = |var: String| ConfigError::MissingEnvVar {
            network: name.to_string(),
            var,
        };

        let url = interpolate(&self.url, &lookup).map_err(missing)?;
        if url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("networks.{name}.url"),
                reason: "must not be empty".to_string(),
            });
        }

        let accounts = self
            .accounts
            .iter()
            .map(|account| interpolate(account, &lookup).map_err(missing))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResolvedNetwork {
            name: name.to_string(),
            url,
            accounts,
            chain_id: self.chain_id,
        })
    }
}

/// Format a reference to the environment variable `var`
fn env_ref(var: &str) -> String {
    format!("${{{var}}}")
}

/// Replace every `${NAME}` in `value` with its value from `lookup`.
///
/// Returns the name of the first variable that is missing or empty. An
/// unterminated `${` is kept literally.
pub fn interpolate<F>(value: &str, lookup: F) -> Result<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };

        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + len];
        match lookup(var) {
            Some(v) if !v.is_empty() => out.push_str(&v),
            _ => return Err(var.to_string()),
        }
        rest = &rest[start + 3 + len..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn interpolates_embedded_references() {
        let lookup = env(&[("HOST", "node.example"), ("KEY", "abc")]);
        let out = interpolate("https://${HOST}/v2/${KEY}", lookup).unwrap();
        assert_eq!(out, "https://node.example/v2/abc");
    }

    #[test]
    fn plain_values_pass_through() {
        assert_eq!(
            interpolate("http://localhost:8545", env(&[])).unwrap(),
            "http://localhost:8545"
        );
        assert_eq!(interpolate("cost: ${", env(&[])).unwrap(), "cost: ${");
    }

    #[test]
    fn empty_variables_count_as_missing() {
        let err = interpolate("${PRIVATE_KEY}", env(&[("PRIVATE_KEY", "")])).unwrap_err();
        assert_eq!(err, "PRIVATE_KEY");
    }

    #[test]
    fn missing_account_variable_names_network() {
        let err = NetworkConfig::mumbai().resolve("mumbai", env(&[])).unwrap_err();
        match err {
            ConfigError::MissingEnvVar { network, var } => {
                assert_eq!(network, "mumbai");
                assert_eq!(var, "PRIVATE_KEY");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn local_network_needs_no_environment() {
        let resolved = NetworkConfig::local().resolve("hardhat", env(&[])).unwrap();
        assert_eq!(resolved.url, LOCAL_RPC_URL);
        assert_eq!(resolved.accounts.len(), 2);
    }
}
