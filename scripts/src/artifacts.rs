//! Reading and writing contract compilation artifacts

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    constants::{ARTIFACT_EXTENSION, ARTIFACT_FORMAT},
    errors::ScriptError,
};

/// A compiled contract, as stored in the artifacts directory
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    /// The artifact format tag
    #[serde(rename = "_format")]
    pub format: String,
    /// The contract's name
    pub contract_name: String,
    /// The source file the contract was compiled from, relative to the project root
    pub source_name: String,
    /// The contract's ABI
    pub abi: JsonAbi,
    /// The contract's creation bytecode
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Construct an artifact in the current format
    pub fn new(contract_name: &str, source_name: &str, abi: JsonAbi, bytecode: Bytes) -> Self {
        Self {
            format: ARTIFACT_FORMAT.to_string(),
            contract_name: contract_name.to_string(),
            source_name: source_name.to_string(),
            abi,
            bytecode,
        }
    }

    /// Read the artifact at `path`
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))
    }

    /// Write the artifact to `path`, creating parent directories as needed
    pub fn write(&self, path: &Path) -> Result<(), ScriptError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
        fs::write(path, contents).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))
    }
}

/// Locate the artifact for `name` under `artifacts_dir`.
///
/// `name` is either a bare contract name, which must be unique across the
/// artifacts, or a fully qualified `path/To/Source.sol:Contract`.
pub fn find_artifact(artifacts_dir: &Path, name: &str) -> Result<PathBuf, ScriptError> {
    if let Some((source, contract)) = name.split_once(':') {
        let path = artifacts_dir
            .join(source)
            .join(format!("{contract}.{ARTIFACT_EXTENSION}"));

        return if path.is_file() {
            Ok(path)
        } else {
            Err(ScriptError::ArtifactParsing(format!(
                "artifact for `{}` not found at {}, have the contracts been compiled?",
                name,
                path.display()
            )))
        };
    }

    let file_name = format!("{name}.{ARTIFACT_EXTENSION}");
    let mut matches = Vec::new();
    collect_files_named(artifacts_dir, &file_name, &mut matches)?;

    match matches.len() {
        0 => Err(ScriptError::ArtifactParsing(format!(
            "artifact for `{}` not found in {}, have the contracts been compiled?",
            name,
            artifacts_dir.display()
        ))),
        1 => {
            let path = matches.remove(0);
            debug!("found artifact for `{}` at {}", name, path.display());
            Ok(path)
        }
        _ => Err(ScriptError::ArtifactParsing(format!(
            "multiple artifacts named `{}`, use a fully qualified name: {}",
            name,
            matches.iter().map(|p| p.display()).join(", ")
        ))),
    }
}

/// Load the artifact for `name`, see [`find_artifact`]
pub fn load_artifact(artifacts_dir: &Path, name: &str) -> Result<ContractArtifact, ScriptError> {
    ContractArtifact::load(&find_artifact(artifacts_dir, name)?)
}

/// Recursively collect the files under `dir` called `file_name`
fn collect_files_named(
    dir: &Path,
    file_name: &str,
    found: &mut Vec<PathBuf>,
) -> Result<(), ScriptError> {
    if !dir.is_dir() {
        return Ok(());
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", dir.display(), e)))?;

    for entry in entries.sorted_by_key(|e| e.as_ref().ok().map(|e| e.path())) {
        let path = entry
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?
            .path();

        if path.is_dir() {
            collect_files_named(&path, file_name, found)?;
        } else if path.file_name().is_some_and(|n| n == file_name) {
            found.push(path);
        }
    }

    Ok(())
}
