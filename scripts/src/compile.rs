//! Compiling the Solidity sources with an external `solc`

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use alloy::{
    json_abi::JsonAbi,
    primitives::{hex, keccak256, Bytes},
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use xenrena_config::{OptimizerConfig, PathsConfig, ProjectConfig};

use crate::{
    artifacts::ContractArtifact,
    constants::{COMPILATION_CACHE_FILE, SOLC_COMBINED_OUTPUTS, SOLIDITY_EXTENSION},
    errors::ScriptError,
};

/// A contract extracted from `solc` output
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledContract {
    /// The source file, relative to the project root
    pub source_name: String,
    /// The contract's name
    pub contract_name: String,
    /// The contract's ABI
    pub abi: JsonAbi,
    /// The contract's creation bytecode, empty for abstract contracts & interfaces
    pub bytecode: Bytes,
}

/// What the last successful compilation was run on
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationCache {
    /// The compiler version
    pub solc_version: String,
    /// The optimizer settings
    pub optimizer: OptimizerConfig,
    /// Keccak-256 hashes of the source files, by source name
    pub content_hashes: BTreeMap<String, String>,
    /// The artifacts written, as `(source name, contract name)` pairs
    pub artifacts: Vec<(String, String)>,
}

impl CompilationCache {
    /// Whether `self` was produced from the same inputs as `current` and all
    /// of its artifacts are still on disk
    pub fn is_fresh(&self, current: &CompilationCache, paths: &PathsConfig) -> bool {
        self.solc_version == current.solc_version
            && self.optimizer == current.optimizer
            && self.content_hashes == current.content_hashes
            && self
                .artifacts
                .iter()
                .all(|(source, contract)| paths.artifact_path(source, contract).is_file())
    }

    /// Read the cache under `cache_dir`; a missing or unreadable cache is
    /// treated as absent
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let contents = fs::read_to_string(cache_dir.join(COMPILATION_CACHE_FILE)).ok()?;
        serde_json::from_str(&contents)
            .inspect_err(|e| warn!("ignoring unreadable compilation cache: {e}"))
            .ok()
    }

    /// Write the cache under `cache_dir`
    pub fn write(&self, cache_dir: &Path) -> Result<(), ScriptError> {
        fs::create_dir_all(cache_dir)
            .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?;
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?;
        fs::write(cache_dir.join(COMPILATION_CACHE_FILE), contents)
            .map_err(|e| ScriptError::ContractCompilation(e.to_string()))
    }
}

/// Options for a compilation run
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// The `solc` executable
    pub solc: PathBuf,
    /// Recompile even when the cache is fresh
    pub force: bool,
}

/// The outcome of a compilation run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Nothing changed since the last run
    UpToDate,
    /// The sources were compiled
    Compiled {
        /// The number of source files compiled
        sources: usize,
        /// The number of artifacts written
        artifacts: usize,
    },
}

/// Compile every Solidity source of the project and write its artifacts
pub fn compile_project(
    config: &ProjectConfig,
    options: &CompileOptions,
) -> Result<CompileOutcome, ScriptError> {
    let paths = config.paths();

    let sources = collect_sources(&paths.sources)?;
    if sources.is_empty() {
        warn!("no Solidity sources found in {}", paths.sources.display());
        return Ok(CompileOutcome::Compiled {
            sources: 0,
            artifacts: 0,
        });
    }

    let mut content_hashes = BTreeMap::new();
    for source in &sources {
        let contents = fs::read(source)
            .map_err(|e| ScriptError::ContractCompilation(format!("{}: {}", source.display(), e)))?;
        content_hashes.insert(
            source_name(&config.root, source),
            format!("{:#x}", keccak256(contents)),
        );
    }

    let mut current = CompilationCache {
        solc_version: config.solidity.version.clone(),
        optimizer: config.solidity.optimizer,
        content_hashes,
        artifacts: Vec::new(),
    };

    let previous = CompilationCache::load(&paths.cache);
    if !options.force {
        if let Some(cached) = &previous {
            if cached.is_fresh(&current, &paths) {
                info!("no Solidity sources changed since the last compilation");
                return Ok(CompileOutcome::UpToDate);
            }
        }
    }

    check_solc_version(&options.solc, &config.solidity.version)?;

    let mut cmd = Command::new(&options.solc);
    cmd.current_dir(&config.root).stderr(Stdio::piped());
    cmd.args(config.solidity.optimizer_args());
    cmd.arg("--combined-json").arg(SOLC_COMBINED_OUTPUTS);
    cmd.arg("--base-path").arg(".");
    // Resolve package imports such as `@openzeppelin/contracts/...`
    if config.root.join("node_modules").is_dir() {
        cmd.arg("--include-path").arg("node_modules");
    }
    cmd.args(current.content_hashes.keys());

    debug!("running {:?}", cmd);
    let output = cmd
        .output()
        .map_err(|e| ScriptError::ContractCompilation(format!("failed to run solc: {e}")))?;
    if !output.status.success() {
        return Err(ScriptError::ContractCompilation(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let contracts = parse_combined_json(&String::from_utf8_lossy(&output.stdout))?;
    current.artifacts = contracts
        .iter()
        .map(|c| (c.source_name.clone(), c.contract_name.clone()))
        .collect();
    if let Some(previous) = &previous {
        remove_stale_artifacts(previous, &current.artifacts, &paths)?;
    }

    for contract in &contracts {
        let path = paths.artifact_path(&contract.source_name, &contract.contract_name);
        ContractArtifact::new(
            &contract.contract_name,
            &contract.source_name,
            contract.abi.clone(),
            contract.bytecode.clone(),
        )
        .write(&path)?;
    }

    current.write(&paths.cache)?;

    Ok(CompileOutcome::Compiled {
        sources: sources.len(),
        artifacts: contracts.len(),
    })
}

/// Delete the artifacts written by the `previous` run that the current run no
/// longer produces, e.g. after a source was moved or a contract renamed
fn remove_stale_artifacts(
    previous: &CompilationCache,
    current: &[(String, String)],
    paths: &PathsConfig,
) -> Result<(), ScriptError> {
    for (source, contract) in previous.artifacts.iter().filter(|a| !current.contains(a)) {
        let path = paths.artifact_path(source, contract);
        match fs::remove_file(&path) {
            Ok(()) => debug!("removed stale artifact {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ScriptError::ContractCompilation(format!(
                    "failed to remove stale artifact {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        // Drop the per-source directory once it is empty
        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir(dir);
        }
    }

    Ok(())
}

/// Every `.sol` file under `dir`, in a stable order
pub fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>, ScriptError> {
    let mut sources = Vec::new();
    if dir.is_dir() {
        collect_sources_into(dir, &mut sources)?;
    }
    sources.sort();
    Ok(sources)
}

/// Recursive helper for [`collect_sources`]
fn collect_sources_into(dir: &Path, sources: &mut Vec<PathBuf>) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ScriptError::ContractCompilation(format!("{}: {}", dir.display(), e)))?;

    for entry in entries {
        let path = entry
            .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?
            .path();
        if path.is_dir() {
            collect_sources_into(&path, sources)?;
        } else if path.extension().is_some_and(|ext| ext == SOLIDITY_EXTENSION) {
            sources.push(path);
        }
    }

    Ok(())
}

/// The name `solc` knows a source by: its path relative to the project root,
/// with forward slashes
fn source_name(root: &Path, source: &Path) -> String {
    let relative = source.strip_prefix(root).unwrap_or(source);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .join("/")
}

/// Check that `solc --version` reports `expected`
pub fn check_solc_version(solc: &Path, expected: &str) -> Result<(), ScriptError> {
    let output = Command::new(solc)
        .arg("--version")
        .output()
        .map_err(|e| {
            ScriptError::ContractCompilation(format!("failed to run {}: {}", solc.display(), e))
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let found = parse_solc_version(&stdout).ok_or_else(|| {
        ScriptError::ContractCompilation(format!("unrecognized `solc --version` output: {stdout}"))
    })?;

    if found != expected {
        return Err(ScriptError::ContractCompilation(format!(
            "configured for solc {expected}, but {} is {found}",
            solc.display()
        )));
    }

    Ok(())
}

/// Extract the bare version from `solc --version` output, e.g. `0.8.19` from
/// `Version: 0.8.19+commit.7dd6d404.Linux.g++`
pub fn parse_solc_version(output: &str) -> Option<&str> {
    let line = output.lines().find_map(|l| l.trim().strip_prefix("Version:"))?;
    let version = line.trim().split(['+', '-']).next()?;
    (!version.is_empty()).then_some(version)
}

/// Parse the output of `solc --combined-json abi,bin`.
///
/// Older compilers emit each ABI as a JSON-encoded string, newer ones inline it.
pub fn parse_combined_json(output: &str) -> Result<Vec<CompiledContract>, ScriptError> {
    let parsed: Value = serde_json::from_str(output)
        .map_err(|e| ScriptError::ContractCompilation(format!("unreadable solc output: {e}")))?;

    let contracts = parsed
        .get("contracts")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ScriptError::ContractCompilation("solc output has no `contracts`".to_string())
        })?;

    contracts
        .iter()
        .map(|(key, output)| {
            let (source_name, contract_name) = key.rsplit_once(':').ok_or_else(|| {
                ScriptError::ContractCompilation(format!("unexpected contract key `{key}`"))
            })?;

            let abi = match output.get("abi") {
                Some(Value::String(encoded)) => serde_json::from_str(encoded),
                Some(inline) => serde_json::from_value(inline.clone()),
                None => Ok(JsonAbi::default()),
            }
            .map_err(|e| ScriptError::ContractCompilation(format!("ABI of `{key}`: {e}")))?;

            let bin = output.get("bin").and_then(Value::as_str).unwrap_or_default();
            let bytecode = hex::decode(bin).map(Bytes::from).map_err(|e| {
                ScriptError::ContractCompilation(format!(
                    "bytecode of `{key}` is not hex ({e}), does it need library linking?"
                ))
            })?;

            Ok(CompiledContract {
                source_name: source_name.to_string(),
                contract_name: contract_name.to_string(),
                abi,
                bytecode,
            })
        })
        .collect()
}
