//! Utilities for the build & deploy scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::primitives::{hex, Address, Bytes};
use serde_json::{Map, Value};
use tracing::info;

use crate::{
    constants::{IMPLEMENTATION_KEY_SUFFIX, PROXY_ADMIN_KEY_SUFFIX},
    errors::ScriptError,
    types::ProxyDeployment,
};

/// Read the deployments file as a JSON object, treating a missing file as empty
pub fn get_deployments(file_path: &Path) -> Result<Map<String, Value>, ScriptError> {
    if !file_path.exists() {
        return Ok(Map::new());
    }

    let contents = fs::read_to_string(file_path)
        .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;

    match serde_json::from_str(&contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ScriptError::ReadDeployments(format!(
            "{} is not a JSON object",
            file_path.display()
        ))),
        Err(e) => Err(ScriptError::ReadDeployments(e.to_string())),
    }
}

/// Parse the address recorded under `network`.`contract_key` in the deployments file
pub fn parse_addr_from_deployments_file(
    file_path: &Path,
    network: &str,
    contract_key: &str,
) -> Result<Address, ScriptError> {
    let deployments = get_deployments(file_path)?;

    let addr = deployments
        .get(network)
        .and_then(|entries| entries.get(contract_key))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ScriptError::ReadDeployments(format!(
                "no `{contract_key}` deployment recorded for network `{network}`"
            ))
        })?;

    Address::from_str(addr).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Record `address` under `network`.`contract_key` in the deployments file,
/// creating the file if it doesn't exist and keeping every other entry
pub fn write_deployed_address(
    file_path: &Path,
    network: &str,
    contract_key: &str,
    address: Address,
) -> Result<(), ScriptError> {
    let mut deployments = get_deployments(file_path)?;

    let entries = deployments
        .entry(network.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(entries) = entries else {
        return Err(ScriptError::WriteDeployments(format!(
            "entry for network `{network}` is not a JSON object"
        )));
    };
    entries.insert(contract_key.to_string(), Value::String(format!("{address:#x}")));

    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    }

    let contents = serde_json::to_string_pretty(&Value::Object(deployments))
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(file_path, contents).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
}

/// Record the addresses of a proxy deployment of `contract`
pub fn record_proxy_deployment(
    file_path: &Path,
    network: &str,
    contract: &str,
    deployment: &ProxyDeployment,
) -> Result<(), ScriptError> {
    write_deployed_address(file_path, network, contract, deployment.proxy)?;
    write_deployed_address(
        file_path,
        network,
        &implementation_key(contract),
        deployment.implementation,
    )?;
    if let Some(admin) = deployment.admin {
        write_deployed_address(file_path, network, &proxy_admin_key(contract), admin)?;
    }

    info!("recorded `{}` deployment in {}", contract, file_path.display());
    Ok(())
}

/// The deployments key of a contract's implementation
pub fn implementation_key(contract: &str) -> String {
    format!("{contract}{IMPLEMENTATION_KEY_SUFFIX}")
}

/// The deployments key of a contract's proxy admin
pub fn proxy_admin_key(contract: &str) -> String {
    format!("{contract}{PROXY_ADMIN_KEY_SUFFIX}")
}

/// The bare contract name of a possibly fully qualified `Source.sol:Contract` name
pub fn bare_contract_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, contract)| contract)
}

/// Parse a hex address given on the command line
pub fn parse_address(addr: &str) -> Result<Address, ScriptError> {
    Address::from_str(addr.trim())
        .map_err(|e| ScriptError::CalldataConstruction(format!("invalid address `{addr}`: {e}")))
}

/// Parse hex calldata given on the command line
pub fn parse_calldata(calldata: &str) -> Result<Bytes, ScriptError> {
    hex::decode(calldata.trim())
        .map(Bytes::from)
        .map_err(|e| ScriptError::CalldataConstruction(format!("invalid calldata: {e}")))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::types::ProxyKind;

    #[test]
    fn deployments_round_trip_per_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        let first = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
        let second = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");

        write_deployed_address(&path, "hardhat", "Xenrena", first).unwrap();
        write_deployed_address(&path, "mumbai", "Xenrena", second).unwrap();

        assert_eq!(parse_addr_from_deployments_file(&path, "hardhat", "Xenrena").unwrap(), first);
        assert_eq!(parse_addr_from_deployments_file(&path, "mumbai", "Xenrena").unwrap(), second);
        assert!(parse_addr_from_deployments_file(&path, "alchemy", "Xenrena").is_err());
    }

    #[test]
    fn proxy_deployment_records_all_addresses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deployments.json");
        let deployment = ProxyDeployment {
            proxy: address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"),
            implementation: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            admin: Some(address!("Cf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9")),
            kind: ProxyKind::Transparent,
        };

        record_proxy_deployment(&path, "hardhat", "Xenrena", &deployment).unwrap();

        let read = |key: &str| parse_addr_from_deployments_file(&path, "hardhat", key).unwrap();
        assert_eq!(read("Xenrena"), deployment.proxy);
        assert_eq!(read("XenrenaImplementation"), deployment.implementation);
        assert_eq!(Some(read("XenrenaProxyAdmin")), deployment.admin);
    }

    #[test]
    fn non_object_deployments_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        fs::write(&path, "[]").unwrap();
        assert!(matches!(get_deployments(&path), Err(ScriptError::ReadDeployments(_))));
    }

    #[test]
    fn command_line_parsing() {
        assert_eq!(bare_contract_name("contracts/Xenrena.sol:Xenrena"), "Xenrena");
        assert_eq!(bare_contract_name("Xenrena"), "Xenrena");
        assert!(parse_address("0x1234").is_err());
        assert_eq!(parse_calldata("0x8129fc1c").unwrap().len(), 4);
        assert!(parse_calldata("0xzz").is_err());
    }
}
