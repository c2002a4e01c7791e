//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::{Address, Bytes},
};
use clap::ValueEnum;

use crate::{artifacts::ContractArtifact, constants::DEFAULT_INITIALIZER, errors::ScriptError};

/// The possible proxy patterns to deploy behind
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ProxyKind {
    /// A `TransparentUpgradeableProxy`, upgraded through its `ProxyAdmin`
    #[default]
    Transparent,
    /// An `ERC1967Proxy` whose implementation carries the upgrade logic
    Uups,
}

impl Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyKind::Transparent => write!(f, "transparent"),
            ProxyKind::Uups => write!(f, "uups"),
        }
    }
}

/// Options for deploying a contract behind a proxy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyOptions {
    /// The function called through the proxy once it is deployed, if any
    pub initializer: Option<String>,
    /// The proxy pattern
    pub kind: ProxyKind,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            initializer: Some(DEFAULT_INITIALIZER.to_string()),
            kind: ProxyKind::default(),
        }
    }
}

/// The addresses produced by a proxy deployment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProxyDeployment {
    /// The proxy, i.e. the address users interact with
    pub proxy: Address,
    /// The implementation the proxy delegates to
    pub implementation: Address,
    /// The proxy admin, for transparent proxies
    pub admin: Option<Address>,
    /// The proxy pattern
    pub kind: ProxyKind,
}

/// Everything needed to deploy instances of a compiled contract
#[derive(Clone, Debug)]
pub struct ContractFactory {
    /// The contract's name
    pub name: String,
    /// The contract's ABI
    pub abi: JsonAbi,
    /// The contract's creation bytecode
    pub bytecode: Bytes,
}

impl From<ContractArtifact> for ContractFactory {
    fn from(artifact: ContractArtifact) -> Self {
        Self {
            name: artifact.contract_name,
            abi: artifact.abi,
            bytecode: artifact.bytecode,
        }
    }
}

impl ContractFactory {
    /// ABI-encode a call to `function` with `args`, choosing the overload
    /// whose arity matches
    pub fn encode_call(&self, function: &str, args: &[DynSolValue]) -> Result<Bytes, ScriptError> {
        let overload = self
            .abi
            .function(function)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
            .ok_or_else(|| {
                ScriptError::CalldataConstruction(format!(
                    "`{}` has no function `{}` taking {} argument(s)",
                    self.name,
                    function,
                    args.len()
                ))
            })?;

        overload
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
    }

    /// The creation code for a deployment, with the ABI-encoded constructor
    /// arguments appended
    pub fn deploy_code(&self, encoded_args: &[u8]) -> Result<Bytes, ScriptError> {
        if self.bytecode.is_empty() {
            return Err(ScriptError::ContractDeployment(format!(
                "`{}` has no bytecode, is it abstract or an interface?",
                self.name
            )));
        }

        Ok([&self.bytecode[..], encoded_args].concat().into())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{hex, U256};

    use super::*;

    fn factory(abi: &str, bytecode: &str) -> ContractFactory {
        ContractFactory {
            name: "Xenrena".to_string(),
            abi: serde_json::from_str(abi).unwrap(),
            bytecode: hex::decode(bytecode).unwrap().into(),
        }
    }

    const ABI: &str = r#"[
        {"type":"function","name":"initialize","inputs":[],"outputs":[],"stateMutability":"nonpayable"},
        {"type":"function","name":"initialize","inputs":[{"name":"cap","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"}
    ]"#;

    #[test]
    fn encodes_empty_initializer_as_selector() {
        let calldata = factory(ABI, "6080").encode_call("initialize", &[]).unwrap();
        // keccak256("initialize()")[..4]
        assert_eq!(calldata.to_vec(), hex!("8129fc1c").to_vec());
    }

    #[test]
    fn picks_overload_by_arity() {
        let calldata = factory(ABI, "6080")
            .encode_call("initialize", &[DynSolValue::Uint(U256::from(7), 256)])
            .unwrap();
        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(calldata[35], 7);
    }

    #[test]
    fn missing_initializer_is_calldata_error() {
        let err = factory(ABI, "6080").encode_call("init", &[]).unwrap_err();
        assert!(matches!(err, ScriptError::CalldataConstruction(_)));
    }

    #[test]
    fn deploy_code_appends_arguments() {
        let code = factory(ABI, "6080").deploy_code(&[0xaa, 0xbb]).unwrap();
        assert_eq!(code.to_vec(), hex!("6080aabb").to_vec());

        let abstract_contract = factory("[]", "");
        assert!(abstract_contract.deploy_code(&[]).is_err());
    }
}
