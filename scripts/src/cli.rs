//! Definitions of CLI arguments and commands for the build & deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use xenrena_config::{
    constants::{DEFAULT_CONFIG_FILE, LOCAL_NETWORK},
    ProjectConfig,
};

use crate::{
    commands::{accounts, compile, deploy, upgrade},
    constants::{
        DEFAULT_DEPLOYMENTS_PATH, DEFAULT_INITIALIZER, NETWORK_ENV_VAR, SOLC_COMMAND,
        XENRENA_CONTRACT,
    },
    errors::ScriptError,
    types::ProxyKind,
};

/// Build and deploy the Xenrena contracts
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the project configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// The configured network to run against
    #[arg(short, long, env = NETWORK_ENV_VAR, default_value = LOCAL_NETWORK)]
    pub network: String,

    /// The script to run
    #[command(subcommand)]
    pub command: Command,
}

/// The available scripts
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a contract behind an upgradeable proxy
    Deploy(DeployArgs),
    /// Upgrade the implementation behind a deployed proxy
    Upgrade(UpgradeArgs),
    /// Compile the Solidity sources into artifacts
    Compile(CompileArgs),
    /// Print the named accounts of the network
    Accounts,
}

impl Command {
    /// Run the script against `network`
    pub async fn run(self, config: &ProjectConfig, network: &str) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(args, config, network).await,
            Command::Upgrade(args) => upgrade(args, config, network).await,
            Command::Compile(args) => compile(args, config),
            Command::Accounts => accounts(config, network),
        }
    }
}

/// Deploy a contract behind an upgradeable proxy.
///
/// The implementation is deployed first, then a proxy pointing at it, and the
/// initializer is called through the proxy in the proxy's constructor. By
/// default this is a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
/// which itself deploys a `ProxyAdmin` owned by the deployer.
#[derive(Args)]
pub struct DeployArgs {
    /// The contract to deploy, by name or as `path/To/Source.sol:Contract`
    #[arg(long, default_value = XENRENA_CONTRACT)]
    pub contract: String,

    /// The initializer to call through the proxy
    #[arg(short, long, default_value = DEFAULT_INITIALIZER)]
    pub initializer: String,

    /// Deploy without calling an initializer
    #[arg(long, conflicts_with = "initializer")]
    pub no_initializer: bool,

    /// The proxy pattern to deploy
    #[arg(short, long, value_enum, default_value_t = ProxyKind::Transparent)]
    pub kind: ProxyKind,

    /// Path to the file recording deployed addresses
    #[arg(short, long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments: PathBuf,
}

/// Upgrade the implementation behind a deployed proxy
#[derive(Args)]
pub struct UpgradeArgs {
    /// Address of the proxy contract, read from the deployments file when omitted
    #[arg(long)]
    pub proxy: Option<String>,

    /// The contract to deploy as the new implementation
    #[arg(long, default_value = XENRENA_CONTRACT)]
    pub contract: String,

    /// The proxy pattern of the deployed proxy
    #[arg(short, long, value_enum, default_value_t = ProxyKind::Transparent)]
    pub kind: ProxyKind,

    /// Optional calldata, in hex form, with which to
    /// call the implementation contract when upgrading
    #[arg(long)]
    pub call: Option<String>,

    /// Path to the file recording deployed addresses
    #[arg(short, long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments: PathBuf,
}

/// Compile the Solidity sources into artifacts
#[derive(Args)]
pub struct CompileArgs {
    /// The `solc` executable to compile with
    #[arg(long, default_value = SOLC_COMMAND)]
    pub solc: PathBuf,

    /// Recompile even if no source changed
    #[arg(short, long)]
    pub force: bool,
}
