//! Implementations of the various scripts

use std::{
    io::{self, Write},
    path::Path,
    str::FromStr,
};

use alloy::{primitives::Bytes, signers::local::PrivateKeySigner};
use tracing::{info, warn};
use xenrena_config::ProjectConfig;

use crate::{
    backend::{DeployBackend, RpcBackend},
    cli::{CompileArgs, DeployArgs, UpgradeArgs},
    compile::{compile_project, CompileOptions, CompileOutcome},
    constants::OZ_UPGRADES_ARTIFACTS_PATH,
    deploy::{run_deploy_script, DeployOptions},
    errors::ScriptError,
    types::{ProxyDeployment, ProxyOptions},
    utils::{
        bare_contract_name, implementation_key, parse_addr_from_deployments_file, parse_address,
        parse_calldata, record_proxy_deployment, write_deployed_address,
    },
};

pub async fn deploy(
    args: DeployArgs,
    config: &ProjectConfig,
    network: &str,
) -> Result<(), ScriptError> {
    let resolved = config.resolve_network(network)?;
    let backend = RpcBackend::connect(&resolved, config.paths().artifacts)
        .await?
        .with_proxy_artifacts(config.root.join(OZ_UPGRADES_ARTIFACTS_PATH));

    let options = DeployOptions {
        contract: args.contract,
        proxy: ProxyOptions {
            initializer: (!args.no_initializer).then_some(args.initializer),
            kind: args.kind,
        },
    };

    let deployment = run_deploy_script(&backend, &options, &mut io::stdout()).await?;

    // The contract is live, recording it is best-effort
    record_deployment(
        &args.deployments,
        network,
        bare_contract_name(&options.contract),
        &deployment,
    );
    Ok(())
}

/// Record a deployment in the deployments file, logging instead of failing.
/// Returns whether the deployment was recorded.
fn record_deployment(
    path: &Path,
    network: &str,
    contract: &str,
    deployment: &ProxyDeployment,
) -> bool {
    match record_proxy_deployment(path, network, contract, deployment) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "`{}` is deployed at {:#x} but could not be recorded in {}: {}",
                contract,
                deployment.proxy,
                path.display(),
                e
            );
            false
        }
    }
}

pub async fn upgrade(
    args: UpgradeArgs,
    config: &ProjectConfig,
    network: &str,
) -> Result<(), ScriptError> {
    let contract_key = bare_contract_name(&args.contract);

    let proxy = match &args.proxy {
        Some(proxy) => parse_address(proxy)?,
        None => parse_addr_from_deployments_file(&args.deployments, network, contract_key)?,
    };
    let call = match &args.call {
        Some(calldata) => parse_calldata(calldata)?,
        None => Bytes::new(),
    };

    let resolved = config.resolve_network(network)?;
    let backend = RpcBackend::connect(&resolved, config.paths().artifacts).await?;

    let factory = backend.contract_factory(&args.contract).await?;
    let implementation = backend
        .upgrade_proxy(proxy, &factory, args.kind, call)
        .await?;

    println!(
        "{} at {:#x} upgraded to implementation {:#x}",
        factory.name, proxy, implementation
    );

    write_deployed_address(
        &args.deployments,
        network,
        &implementation_key(contract_key),
        implementation,
    )
}

pub fn compile(args: CompileArgs, config: &ProjectConfig) -> Result<(), ScriptError> {
    let options = CompileOptions {
        solc: args.solc,
        force: args.force,
    };

    match compile_project(config, &options)? {
        CompileOutcome::UpToDate => println!("Nothing to compile"),
        CompileOutcome::Compiled { sources, artifacts } => {
            info!("wrote {} artifact(s)", artifacts);
            println!("Compiled {} Solidity file(s) successfully", sources);
        }
    }

    Ok(())
}

pub fn accounts(config: &ProjectConfig, network: &str) -> Result<(), ScriptError> {
    write_accounts(config, network, &mut io::stdout())
}

/// Write each named account of `network` with its address to `out`
fn write_accounts<W: Write>(
    config: &ProjectConfig,
    network: &str,
    out: &mut W,
) -> Result<(), ScriptError> {
    let resolved = config.resolve_network(network)?;

    for (name, &index) in &config.named_accounts {
        let line = match resolved.accounts.get(index) {
            Some(key) => {
                let signer = PrivateKeySigner::from_str(key.trim()).map_err(|e| {
                    ScriptError::ClientInitialization(format!(
                        "invalid private key for account #{index}: {e}"
                    ))
                })?;
                format!("{name} (#{index}): {}", signer.address())
            }
            None => format!("{name} (#{index}): not configured on `{network}`"),
        };
        writeln!(out, "{line}").map_err(|e| ScriptError::Output(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, Address};
    use xenrena_config::constants::LOCAL_NETWORK;

    use super::*;

    fn deployment() -> ProxyDeployment {
        ProxyDeployment {
            proxy: address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"),
            implementation: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            admin: None,
            kind: Default::default(),
        }
    }

    #[test]
    fn local_accounts_resolve_to_dev_addresses() {
        let mut out = Vec::new();
        write_accounts(&ProjectConfig::default(), LOCAL_NETWORK, &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        let deployer: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let user: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
        assert_eq!(
            out.lines().collect::<Vec<_>>(),
            [format!("deployer (#0): {deployer}"), format!("user (#1): {user}")]
        );
    }

    #[test]
    fn accounts_past_the_key_list_are_not_configured() {
        let mut config = ProjectConfig::default();
        config.named_accounts.insert("treasury".to_string(), 5);

        let mut out = Vec::new();
        write_accounts(&config, LOCAL_NETWORK, &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("treasury (#5): not configured on `hardhat`"));
    }

    #[test]
    fn accounts_on_unknown_network_fail() {
        let err = write_accounts(&ProjectConfig::default(), "mainnet", &mut Vec::<u8>::new());
        assert!(matches!(err, Err(ScriptError::Config(_))));
    }

    #[test]
    fn unrecordable_deployment_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();

        // The deployments file's parent is a regular file
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let unwritable = blocker.join("deployments.json");
        assert!(!record_deployment(&unwritable, LOCAL_NETWORK, "Xenrena", &deployment()));

        let path = dir.path().join("deployments.json");
        assert!(record_deployment(&path, LOCAL_NETWORK, "Xenrena", &deployment()));
        assert!(path.is_file());
    }
}
