//! Scripts for building, deploying and upgrading the Xenrena smart contracts.

#![deny(missing_docs)]

pub mod artifacts;
pub mod backend;
pub mod cli;
mod commands;
pub mod compile;
pub mod constants;
pub mod deploy;
pub mod errors;
mod solidity;
pub mod types;
pub mod utils;
