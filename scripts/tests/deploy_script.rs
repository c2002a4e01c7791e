//! Runs the deploy script against an in-memory backend

use std::sync::Mutex;

use alloy::{
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    primitives::{address, Address, Bytes},
};
use eyre::Result;
use scripts::{
    backend::DeployBackend,
    deploy::{exit_status, run_deploy_script, DeployOptions},
    errors::ScriptError,
    types::{ContractFactory, ProxyDeployment, ProxyKind, ProxyOptions},
};

const DEPLOYER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
const IMPLEMENTATION: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
const PROXY: Address = address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0");
const ADMIN: Address = address!("Cf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9");

/// The deploy calls the mock backend received
#[derive(Debug, Clone, PartialEq, Eq)]
struct DeployCall {
    contract: String,
    num_args: usize,
    options: ProxyOptions,
}

#[derive(Default)]
struct MockBackend {
    signers: Vec<Address>,
    /// When set, every deployment is rejected with this reason
    reject: Option<String>,
    calls: Mutex<Vec<DeployCall>>,
}

impl MockBackend {
    fn with_deployer() -> Self {
        Self {
            signers: vec![DEPLOYER],
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<DeployCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl DeployBackend for MockBackend {
    async fn signers(&self) -> Result<Vec<Address>, ScriptError> {
        Ok(self.signers.clone())
    }

    async fn contract_factory(&self, name: &str) -> Result<ContractFactory, ScriptError> {
        Ok(ContractFactory {
            name: name.to_string(),
            abi: JsonAbi::default(),
            bytecode: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]),
        })
    }

    async fn deploy_proxy(
        &self,
        factory: &ContractFactory,
        args: &[DynSolValue],
        options: &ProxyOptions,
    ) -> Result<ProxyDeployment, ScriptError> {
        self.calls.lock().unwrap().push(DeployCall {
            contract: factory.name.clone(),
            num_args: args.len(),
            options: options.clone(),
        });

        if let Some(reason) = &self.reject {
            return Err(ScriptError::ContractDeployment(reason.clone()));
        }

        Ok(ProxyDeployment {
            proxy: PROXY,
            implementation: IMPLEMENTATION,
            admin: (options.kind == ProxyKind::Transparent).then_some(ADMIN),
            kind: options.kind,
        })
    }

    async fn upgrade_proxy(
        &self,
        _proxy: Address,
        _factory: &ContractFactory,
        _kind: ProxyKind,
        _call: Bytes,
    ) -> Result<Address, ScriptError> {
        unimplemented!("the deploy script never upgrades")
    }
}

#[tokio::test]
async fn deploys_xenrena_behind_initialized_proxy() -> Result<()> {
    let backend = MockBackend::with_deployer();
    let mut stdout = Vec::new();

    let result = run_deploy_script(&backend, &DeployOptions::default(), &mut stdout).await;
    let mut stderr = Vec::new();
    assert_eq!(exit_status(&result, &mut stderr), 0);
    assert!(stderr.is_empty());

    let deployment = result?;
    assert_eq!(deployment.proxy, PROXY);
    assert_eq!(deployment.admin, Some(ADMIN));

    assert_eq!(
        backend.calls(),
        vec![DeployCall {
            contract: "Xenrena".to_string(),
            num_args: 0,
            options: ProxyOptions {
                initializer: Some("initialize".to_string()),
                kind: ProxyKind::Transparent,
            },
        }]
    );

    let stdout = String::from_utf8(stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], format!("Deploying contracts with the account: {DEPLOYER}"));
    assert_eq!(lines[1], format!("Xenrena deployed to: {PROXY}"));
    assert!(lines[1].starts_with("Xenrena deployed to: 0x"));

    Ok(())
}

#[tokio::test]
async fn rejected_deployment_exits_with_failure() -> Result<()> {
    let backend = MockBackend {
        reject: Some("insufficient funds for gas".to_string()),
        ..MockBackend::with_deployer()
    };
    let mut stdout = Vec::new();

    let result = run_deploy_script(&backend, &DeployOptions::default(), &mut stdout).await;
    let mut stderr = Vec::new();
    assert_eq!(exit_status(&result, &mut stderr), 1);

    let stderr = String::from_utf8(stderr)?;
    assert!(stderr.contains("insufficient funds for gas"));

    // The deployer is announced, but no address is ever reported
    let stdout = String::from_utf8(stdout)?;
    assert!(stdout.contains("Deploying contracts with the account"));
    assert!(!stdout.contains("deployed to"));

    Ok(())
}

#[tokio::test]
async fn no_signers_fails_before_deploying() -> Result<()> {
    let backend = MockBackend::default();
    let mut stdout = Vec::new();

    let result = run_deploy_script(&backend, &DeployOptions::default(), &mut stdout).await;
    assert!(matches!(result, Err(ScriptError::NoSigners(_))));
    assert!(backend.calls().is_empty());
    assert!(stdout.is_empty());

    Ok(())
}

#[tokio::test]
async fn uups_deploy_without_initializer() -> Result<()> {
    let backend = MockBackend::with_deployer();
    let options = DeployOptions {
        proxy: ProxyOptions {
            initializer: None,
            kind: ProxyKind::Uups,
        },
        ..Default::default()
    };

    let deployment = run_deploy_script(&backend, &options, &mut Vec::<u8>::new()).await?;
    assert_eq!(deployment.kind, ProxyKind::Uups);
    assert_eq!(deployment.admin, None);
    assert_eq!(backend.calls()[0].options, options.proxy);

    Ok(())
}
