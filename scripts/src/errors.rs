//! Definitions of errors that can occur during the execution of the build & deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use xenrena_config::ConfigError;

/// Errors that can occur during the execution of the build & deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error loading or resolving the project configuration
    Config(String),
    /// Error reading the `deployments.json` file
    ReadDeployments(String),
    /// Error writing the `deployments.json` file
    WriteDeployments(String),
    /// Error reading, parsing or writing a compilation artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// No signer is configured for the selected network
    NoSigners(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// Error compiling the Solidity sources
    ContractCompilation(String),
    /// Error writing script output
    Output(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Config(s) => write!(f, "configuration error: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::NoSigners(s) => write!(f, "no signer available: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::ContractCompilation(s) => write!(f, "error compiling contracts: {}", s),
            ScriptError::Output(s) => write!(f, "error writing output: {}", s),
        }
    }
}

impl Error for ScriptError {}

impl From<ConfigError> for ScriptError {
    fn from(e: ConfigError) -> Self {
        ScriptError::Config(e.to_string())
    }
}
