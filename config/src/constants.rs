//! Constants describing the default project configuration

/// The default name of the project configuration file
pub const DEFAULT_CONFIG_FILE: &str = "xenrena.toml";

/// The name of the dotenv file loaded before the configuration
pub const DOTENV_FILE: &str = ".env";

/// The `solc` version the contracts are written against
pub const DEFAULT_SOLC_VERSION: &str = "0.8.19";

/// The default number of optimizer runs
pub const DEFAULT_OPTIMIZER_RUNS: u32 = 200;

/// The name of the built-in local development network
pub const LOCAL_NETWORK: &str = "hardhat";

/// The RPC URL of the local development node
pub const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";

/// The private keys of the first two accounts on a local development node,
/// derived from the `test test ... junk` mnemonic
pub const LOCAL_DEV_KEYS: [&str; 2] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
];

/// The name of the Polygon Mumbai testnet
pub const MUMBAI_NETWORK: &str = "mumbai";

/// The public Mumbai RPC endpoint
pub const MUMBAI_RPC_URL: &str = "https://rpc-mumbai.maticvigil.com";

/// The name of the network served through an Alchemy endpoint
pub const ALCHEMY_NETWORK: &str = "alchemy";

/// The environment variable holding the deployer's private key
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// The environment variable holding the Alchemy RPC URL
pub const ALCHEMY_URL_ENV_VAR: &str = "ALCHEMY_URL";

/// The named account that signs deployments
pub const DEPLOYER_ACCOUNT: &str = "deployer";

/// The named account used for interacting as a regular user
pub const USER_ACCOUNT: &str = "user";

/// The default directory holding contract sources
pub const DEFAULT_SOURCES_PATH: &str = "./contracts";

/// The default directory holding contract tests
pub const DEFAULT_TESTS_PATH: &str = "./tests";

/// The default directory holding the compilation cache
pub const DEFAULT_CACHE_PATH: &str = "./cache";

/// The default directory holding compilation artifacts
pub const DEFAULT_ARTIFACTS_PATH: &str = "./artifacts";
