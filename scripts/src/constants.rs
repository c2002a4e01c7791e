//! Constants used in the build & deploy scripts

use alloy::primitives::{b256, B256};

/// The name of the contract deployed by default
pub const XENRENA_CONTRACT: &str = "Xenrena";

/// The name of the initializer invoked through the proxy on deployment
pub const DEFAULT_INITIALIZER: &str = "initialize";

/// The name of the OpenZeppelin transparent proxy contract
pub const TRANSPARENT_PROXY_CONTRACT: &str = "TransparentUpgradeableProxy";

/// The name of the OpenZeppelin ERC1967 proxy contract, used for UUPS proxies
pub const ERC1967_PROXY_CONTRACT: &str = "ERC1967Proxy";

/// The source name of the transparent proxy in OpenZeppelin Contracts v5
pub const TRANSPARENT_PROXY_SOURCE: &str =
    "@openzeppelin/contracts/proxy/transparent/TransparentUpgradeableProxy.sol";

/// The source name of the ERC1967 proxy in OpenZeppelin Contracts v5
pub const ERC1967_PROXY_SOURCE: &str = "@openzeppelin/contracts/proxy/ERC1967/ERC1967Proxy.sol";

/// The prebuilt proxy artifacts published with `@openzeppelin/upgrades-core`,
/// relative to the project root. Used when the project compiles no proxy of
/// its own.
pub const OZ_UPGRADES_ARTIFACTS_PATH: &str = "node_modules/@openzeppelin/upgrades-core/artifacts";

/// The number of confirmations to wait for on deployment & upgrade transactions
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The storage slot containing the implementation address in an ERC1967 proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const PROXY_IMPLEMENTATION_STORAGE_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The suffix appended to a contract's name to key its implementation in the
/// deployments file
pub const IMPLEMENTATION_KEY_SUFFIX: &str = "Implementation";

/// The suffix appended to a contract's name to key its proxy admin in the
/// deployments file
pub const PROXY_ADMIN_KEY_SUFFIX: &str = "ProxyAdmin";

/// The artifact format tag written into every artifact
pub const ARTIFACT_FORMAT: &str = "hh-sol-artifact-1";

/// The file extension of Solidity sources
pub const SOLIDITY_EXTENSION: &str = "sol";

/// The file extension of artifacts
pub const ARTIFACT_EXTENSION: &str = "json";

/// The name of the compilation cache file
pub const COMPILATION_CACHE_FILE: &str = "solidity-files-cache.json";

/// The default `solc` executable
pub const SOLC_COMMAND: &str = "solc";

/// The outputs requested from `solc --combined-json`
pub const SOLC_COMBINED_OUTPUTS: &str = "abi,bin";

/// The environment variable used to select the network
pub const NETWORK_ENV_VAR: &str = "XENRENA_NETWORK";

/// The default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
