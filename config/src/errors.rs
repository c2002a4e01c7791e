//! Definitions of errors that can occur while loading the project configuration

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur while loading or resolving the project configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Error reading the configuration file or a `.env` file
    Read(String),
    /// Error parsing the configuration file
    Parse(String),
    /// A configuration field has an invalid value
    InvalidValue {
        /// The dotted path of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },
    /// A network references an environment variable that is not set
    MissingEnvVar {
        /// The network whose configuration references the variable
        network: String,
        /// The name of the variable
        var: String,
    },
    /// The requested network is not declared in the configuration
    UnknownNetwork(String),
    /// The requested named account is not declared in the configuration
    UnknownNamedAccount(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(s) => write!(f, "error reading configuration: {}", s),
            ConfigError::Parse(s) => write!(f, "error parsing configuration: {}", s),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid configuration value for `{}`: {}", field, reason)
            }
            ConfigError::MissingEnvVar { network, var } => write!(
                f,
                "network `{}` requires environment variable `{}`, which is not set",
                network, var
            ),
            ConfigError::UnknownNetwork(name) => write!(f, "unknown network `{}`", name),
            ConfigError::UnknownNamedAccount(name) => {
                write!(f, "unknown named account `{}`", name)
            }
        }
    }
}

impl Error for ConfigError {}
