//! Definitions of Solidity functions called during deployment & upgrades

use alloy::sol;

sol! {
    /// The admin contract owning a `TransparentUpgradeableProxy`
    #[sol(rpc)]
    interface IProxyAdmin {
        function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;
    }

    /// The upgrade entrypoint of a UUPS implementation, called through its proxy
    #[sol(rpc)]
    interface IUUPSUpgradeable {
        function upgradeToAndCall(address newImplementation, bytes memory data) external payable;
    }
}
