//! The chain-facing operations the scripts are written against, and their
//! implementation over a JSON-RPC node

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{
    dyn_abi::DynSolValue,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::SolValue,
    transports::http::reqwest::Url,
};
use tracing::{debug, info};
use xenrena_config::ResolvedNetwork;

use crate::{
    artifacts::load_artifact,
    constants::{
        ERC1967_PROXY_CONTRACT, ERC1967_PROXY_SOURCE, NUM_DEPLOY_CONFIRMATIONS,
        PROXY_ADMIN_STORAGE_SLOT, PROXY_IMPLEMENTATION_STORAGE_SLOT, TRANSPARENT_PROXY_CONTRACT,
        TRANSPARENT_PROXY_SOURCE,
    },
    errors::ScriptError,
    solidity::{IProxyAdmin, IUUPSUpgradeable},
    types::{ContractFactory, ProxyDeployment, ProxyKind, ProxyOptions},
};

/// The operations a deploy script needs from the chain.
///
/// Every method resolves only once its transactions are confirmed.
#[allow(async_fn_in_trait)]
pub trait DeployBackend {
    /// The addresses of the configured signers, in account index order
    async fn signers(&self) -> Result<Vec<Address>, ScriptError>;

    /// A factory for the compiled contract `name`
    async fn contract_factory(&self, name: &str) -> Result<ContractFactory, ScriptError>;

    /// Deploy an implementation from `factory` behind a new proxy, calling
    /// the initializer in `options` with `args` through the proxy
    async fn deploy_proxy(
        &self,
        factory: &ContractFactory,
        args: &[DynSolValue],
        options: &ProxyOptions,
    ) -> Result<ProxyDeployment, ScriptError>;

    /// Deploy a new implementation from `factory` and point `proxy` at it,
    /// calling it with `call` when non-empty. Returns the new implementation.
    async fn upgrade_proxy(
        &self,
        proxy: Address,
        factory: &ContractFactory,
        kind: ProxyKind,
        call: Bytes,
    ) -> Result<Address, ScriptError>;
}

/// A [`DeployBackend`] talking to a node over HTTP JSON-RPC, signing with the
/// accounts of the selected network
pub struct RpcBackend {
    /// The name of the network
    network: String,
    /// The RPC provider, signing with the first account when there is one
    provider: DynProvider,
    /// The network's signers, in account index order
    signers: Vec<PrivateKeySigner>,
    /// The directory holding compilation artifacts
    artifacts_dir: PathBuf,
    /// Prebuilt proxy artifacts, used when the project compiles no proxy
    proxy_artifacts_dir: Option<PathBuf>,
}

impl RpcBackend {
    /// Sets up the client for `network`, checking the node's chain ID against
    /// the configured one
    pub async fn connect(
        network: &ResolvedNetwork,
        artifacts_dir: PathBuf,
    ) -> Result<Self, ScriptError> {
        let url = Url::parse(&network.url)
            .map_err(|e| ScriptError::ClientInitialization(format!("invalid RPC url: {e}")))?;

        let signers = parse_signers(&network.accounts)?;

        let provider = match signers.split_first() {
            Some((default_signer, rest)) => {
                let mut wallet = EthereumWallet::from(default_signer.clone());
                for signer in rest {
                    wallet.register_signer(signer.clone());
                }
                DynProvider::new(ProviderBuilder::new().wallet(wallet).connect_http(url))
            }
            None => DynProvider::new(ProviderBuilder::new().connect_http(url)),
        };

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

        if let Some(expected) = network.chain_id {
            if expected != chain_id {
                return Err(ScriptError::ClientInitialization(format!(
                    "network `{}` expects chain ID {}, but the node reports {}",
                    network.name, expected, chain_id
                )));
            }
        }

        info!(
            "connected to network `{}` (chain ID {}) with {} account(s)",
            network.name,
            chain_id,
            signers.len()
        );

        Ok(Self {
            network: network.name.clone(),
            provider,
            signers,
            artifacts_dir,
            proxy_artifacts_dir: None,
        })
    }

    /// Fall back to the prebuilt proxy artifacts under `dir` when the project's
    /// own artifacts hold no proxy contract
    pub fn with_proxy_artifacts(mut self, dir: PathBuf) -> Self {
        self.proxy_artifacts_dir = Some(dir);
        self
    }

    /// The address paying for and owning deployments
    fn deployer(&self) -> Result<Address, ScriptError> {
        self.signers
            .first()
            .map(|s| s.address())
            .ok_or_else(|| {
                ScriptError::NoSigners(format!(
                    "network `{}` has no accounts configured",
                    self.network
                ))
            })
    }

    /// Send a contract creation transaction and wait for it to be confirmed,
    /// returning the created contract's address
    async fn deploy_code(&self, code: Bytes, label: &str) -> Result<Address, ScriptError> {
        self.deployer()?;

        let tx = TransactionRequest::default().with_deploy_code(code);
        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::ContractDeployment(format!("{label}: {e}")))?
            .with_required_confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractDeployment(format!("{label}: {e}")))?;

        if !receipt.status() {
            return Err(ScriptError::ContractDeployment(format!(
                "{label}: creation transaction {:#x} reverted",
                receipt.transaction_hash
            )));
        }

        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::ContractDeployment(format!(
                "{label}: receipt for {:#x} has no contract address",
                receipt.transaction_hash
            ))
        })?;

        info!(
            "deployed {} at {:#x} in tx {:#x}",
            label, address, receipt.transaction_hash
        );
        Ok(address)
    }

    /// Read an address stored in the storage slot `slot` of `contract`
    async fn read_address_slot(
        &self,
        contract: Address,
        slot: B256,
    ) -> Result<Address, ScriptError> {
        let word = self
            .provider
            .get_storage_at(contract, U256::from_be_bytes(slot.0))
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(Address::from_word(B256::from(word.to_be_bytes::<32>())))
    }

    /// Check that `proxy` delegates to `implementation`
    async fn verify_implementation(
        &self,
        proxy: Address,
        implementation: Address,
    ) -> Result<(), ScriptError> {
        let current = self
            .read_address_slot(proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT)
            .await?;

        if current != implementation {
            return Err(ScriptError::ContractInteraction(format!(
                "proxy {proxy:#x} points at {current:#x}, expected {implementation:#x}"
            )));
        }

        debug!("proxy {:#x} delegates to {:#x}", proxy, implementation);
        Ok(())
    }
}

impl DeployBackend for RpcBackend {
    async fn signers(&self) -> Result<Vec<Address>, ScriptError> {
        Ok(self.signers.iter().map(|s| s.address()).collect())
    }

    async fn contract_factory(&self, name: &str) -> Result<ContractFactory, ScriptError> {
        load_artifact(&self.artifacts_dir, name).map(ContractFactory::from)
    }

    async fn deploy_proxy(
        &self,
        factory: &ContractFactory,
        args: &[DynSolValue],
        options: &ProxyOptions,
    ) -> Result<ProxyDeployment, ScriptError> {
        let owner = self.deployer()?;
        let init_calldata = initializer_calldata(factory, args, options)?;

        if options.kind == ProxyKind::Uups {
            ensure_uups_upgradeable(factory)?;
        }

        // Resolve the proxy artifact before sending anything
        let proxy_factory = load_proxy_factory(
            &self.artifacts_dir,
            self.proxy_artifacts_dir.as_deref(),
            options.kind,
        )?;

        let implementation_code = factory.deploy_code(&[])?;
        let implementation = self
            .deploy_code(implementation_code, &format!("`{}` implementation", factory.name))
            .await?;

        let constructor_args =
            proxy_constructor_args(options.kind, implementation, owner, init_calldata);
        let proxy_code = proxy_factory.deploy_code(&constructor_args)?;
        let proxy = self
            .deploy_code(proxy_code, &format!("{} proxy", options.kind))
            .await?;

        self.verify_implementation(proxy, implementation).await?;

        // The transparent proxy deploys its own admin, recorded in the EIP1967 admin slot:
        // https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/
        // contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
        let admin = match options.kind {
            ProxyKind::Transparent => {
                Some(self.read_address_slot(proxy, PROXY_ADMIN_STORAGE_SLOT).await?)
            }
            ProxyKind::Uups => None,
        };

        Ok(ProxyDeployment {
            proxy,
            implementation,
            admin,
            kind: options.kind,
        })
    }

    async fn upgrade_proxy(
        &self,
        proxy: Address,
        factory: &ContractFactory,
        kind: ProxyKind,
        call: Bytes,
    ) -> Result<Address, ScriptError> {
        if kind == ProxyKind::Uups {
            ensure_uups_upgradeable(factory)?;
        }

        let implementation_code = factory.deploy_code(&[])?;
        let implementation = self
            .deploy_code(implementation_code, &format!("`{}` implementation", factory.name))
            .await?;

        let pending = match kind {
            ProxyKind::Transparent => {
                let admin = self.read_address_slot(proxy, PROXY_ADMIN_STORAGE_SLOT).await?;
                if admin == Address::ZERO {
                    return Err(ScriptError::ContractInteraction(format!(
                        "{proxy:#x} has no proxy admin, is it a transparent proxy?"
                    )));
                }

                IProxyAdmin::new(admin, self.provider.clone())
                    .upgradeAndCall(proxy, implementation, call)
                    .send()
                    .await
            }
            ProxyKind::Uups => {
                IUUPSUpgradeable::new(proxy, self.provider.clone())
                    .upgradeToAndCall(implementation, call)
                    .send()
                    .await
            }
        }
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        let receipt = pending
            .with_required_confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        if !receipt.status() {
            return Err(ScriptError::ContractInteraction(format!(
                "upgrade transaction {:#x} reverted",
                receipt.transaction_hash
            )));
        }

        self.verify_implementation(proxy, implementation).await?;
        Ok(implementation)
    }
}

/// Parse the network's private keys, keeping their order
fn parse_signers(accounts: &[String]) -> Result<Vec<PrivateKeySigner>, ScriptError> {
    accounts
        .iter()
        .enumerate()
        .map(|(i, key)| {
            PrivateKeySigner::from_str(key.trim()).map_err(|e| {
                ScriptError::ClientInitialization(format!(
                    "invalid private key for account #{i}: {e}"
                ))
            })
        })
        .collect()
}

/// The calldata the proxy forwards to the implementation on construction
fn initializer_calldata(
    factory: &ContractFactory,
    args: &[DynSolValue],
    options: &ProxyOptions,
) -> Result<Bytes, ScriptError> {
    match &options.initializer {
        Some(initializer) => factory.encode_call(initializer, args),
        None if args.is_empty() => Ok(Bytes::new()),
        None => Err(ScriptError::CalldataConstruction(
            "initializer arguments given without an initializer".to_string(),
        )),
    }
}

/// The ABI-encoded constructor arguments of the proxy contract:
/// `TransparentUpgradeableProxy(logic, initialOwner, data)` or
/// `ERC1967Proxy(logic, data)`
fn proxy_constructor_args(
    kind: ProxyKind,
    implementation: Address,
    owner: Address,
    init_calldata: Bytes,
) -> Vec<u8> {
    match kind {
        ProxyKind::Transparent => (implementation, owner, init_calldata).abi_encode_params(),
        ProxyKind::Uups => (implementation, init_calldata).abi_encode_params(),
    }
}

/// The factory for the proxy of `kind`, from the project's artifacts if it
/// compiles one, else from the prebuilt OpenZeppelin artifacts in `fallback_dir`
fn load_proxy_factory(
    artifacts_dir: &Path,
    fallback_dir: Option<&Path>,
    kind: ProxyKind,
) -> Result<ContractFactory, ScriptError> {
    let (contract, source) = match kind {
        ProxyKind::Transparent => (TRANSPARENT_PROXY_CONTRACT, TRANSPARENT_PROXY_SOURCE),
        ProxyKind::Uups => (ERC1967_PROXY_CONTRACT, ERC1967_PROXY_SOURCE),
    };

    let project_err = match load_artifact(artifacts_dir, contract) {
        Ok(artifact) => return Ok(artifact.into()),
        Err(e) => e,
    };

    match fallback_dir {
        Some(dir) => {
            let artifact = load_artifact(dir, &format!("{source}:{contract}"))
                .map_err(|_| project_err)?;
            debug!("using the prebuilt {} from {}", contract, dir.display());
            Ok(artifact.into())
        }
        None => Err(project_err),
    }
}

/// A UUPS proxy can only be upgraded through its implementation, so the
/// implementation must expose the upgrade entrypoint
fn ensure_uups_upgradeable(factory: &ContractFactory) -> Result<(), ScriptError> {
    if factory.abi.function("upgradeToAndCall").is_none() {
        return Err(ScriptError::ContractDeployment(format!(
            "`{}` does not expose `upgradeToAndCall` and cannot back a UUPS proxy",
            factory.name
        )));
    }

    Ok(())
}
