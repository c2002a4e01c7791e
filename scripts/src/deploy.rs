//! The deploy script: deploy a contract behind a proxy and report its address

use std::io::Write;

use tracing::info;

use crate::{
    backend::DeployBackend,
    constants::XENRENA_CONTRACT,
    errors::ScriptError,
    types::{ProxyDeployment, ProxyOptions},
};

/// What the deploy script deploys
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployOptions {
    /// The contract to deploy, by bare or fully qualified name
    pub contract: String,
    /// How to deploy it behind a proxy
    pub proxy: ProxyOptions,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            contract: XENRENA_CONTRACT.to_string(),
            proxy: ProxyOptions::default(),
        }
    }
}

/// Deploy `options.contract` behind a proxy, initialized with no arguments.
///
/// Uses the first signer the backend reports and writes the deployer and the
/// resulting proxy address to `out`.
pub async fn run_deploy_script<B, W>(
    backend: &B,
    options: &DeployOptions,
    out: &mut W,
) -> Result<ProxyDeployment, ScriptError>
where
    B: DeployBackend,
    W: Write,
{
    let signers = backend.signers().await?;
    let deployer = signers
        .first()
        .ok_or_else(|| ScriptError::NoSigners("the backend reported no accounts".to_string()))?;

    writeln!(out, "Deploying contracts with the account: {deployer}")
        .map_err(|e| ScriptError::Output(e.to_string()))?;

    let factory = backend.contract_factory(&options.contract).await?;
    let deployment = backend
        .deploy_proxy(&factory, &[], &options.proxy)
        .await?;

    info!(
        "`{}` implementation at {:#x}, {} proxy at {:#x}",
        factory.name, deployment.implementation, deployment.kind, deployment.proxy
    );
    if let Some(admin) = deployment.admin {
        info!("proxy admin at {:#x}", admin);
    }

    writeln!(out, "{} deployed to: {}", factory.name, deployment.proxy)
        .map_err(|e| ScriptError::Output(e.to_string()))?;

    Ok(deployment)
}

/// The process exit status for a script result: 0 on success, otherwise 1
/// after writing the error to `err`
pub fn exit_status<T, W: Write>(result: &Result<T, ScriptError>, err: &mut W) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => {
            // Nothing left to report a failed write to
            let _ = writeln!(err, "Error: {e}");
            1
        }
    }
}
