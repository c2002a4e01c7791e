//! Assertions on the shape of the project configuration

use std::{collections::HashMap, fs, path::Path};

use eyre::Result;
use xenrena_config::{
    constants::{LOCAL_NETWORK, LOCAL_RPC_URL},
    ConfigError, ProjectConfig,
};

/// The configuration file shipped at the repository root
const PROJECT_CONFIG: &str = include_str!("../../xenrena.toml");

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| map.get(k).cloned()
}

#[test]
fn compiler_version_matches_declared() -> Result<()> {
    let config = ProjectConfig::from_toml(PROJECT_CONFIG, Path::new("."))?;
    assert_eq!(config.solidity.version, "0.8.19");
    Ok(())
}

#[test]
fn optimizer_enabled_with_declared_runs() -> Result<()> {
    let config = ProjectConfig::from_toml(PROJECT_CONFIG, Path::new("."))?;
    assert!(config.solidity.optimizer.enabled);
    assert_eq!(config.solidity.optimizer.runs, 200);
    Ok(())
}

#[test]
fn shipped_file_matches_defaults() -> Result<()> {
    let config = ProjectConfig::from_toml(PROJECT_CONFIG, Path::new("."))?;
    assert_eq!(config, ProjectConfig::default());
    Ok(())
}

#[test]
fn networks_resolve_with_environment_set() -> Result<()> {
    let config = ProjectConfig::from_toml(PROJECT_CONFIG, Path::new("."))?;
    let env = lookup(&[
        ("PRIVATE_KEY", "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"),
        ("ALCHEMY_URL", "https://polygon-mumbai.g.alchemy.com/v2/key"),
    ]);

    for name in config.networks.keys() {
        let network = config.resolve_network_with(name, &env)?;
        assert!(!network.url.is_empty(), "network `{name}` has an empty url");
        assert!(
            !network.accounts.is_empty() && network.accounts.iter().all(|a| !a.is_empty()),
            "network `{name}` has no accounts"
        );
    }

    let alchemy = config.resolve_network_with("alchemy", &env)?;
    assert_eq!(alchemy.url, "https://polygon-mumbai.g.alchemy.com/v2/key");
    Ok(())
}

#[test]
fn networks_report_missing_environment() -> Result<()> {
    let config = ProjectConfig::from_toml(PROJECT_CONFIG, Path::new("."))?;
    let env = lookup(&[("PRIVATE_KEY", "0x01")]);

    let err = config.resolve_network_with("alchemy", &env).unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar { ref var, .. } if var == "ALCHEMY_URL"));

    let local = config.resolve_network_with(LOCAL_NETWORK, lookup(&[]))?;
    assert_eq!(local.url, LOCAL_RPC_URL);
    Ok(())
}

#[test]
fn paths_are_anchored_at_config_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("xenrena.toml");
    fs::write(&path, PROJECT_CONFIG)?;

    let config = ProjectConfig::load(&path)?;
    let paths = config.paths();
    assert_eq!(paths.sources, dir.path().join("contracts"));
    assert_eq!(paths.tests, dir.path().join("tests"));
    assert_eq!(paths.cache, dir.path().join("cache"));
    assert_eq!(paths.artifacts, dir.path().join("artifacts"));
    Ok(())
}

#[test]
fn dotenv_next_to_config_is_loaded() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("xenrena.toml");
    fs::write(
        &path,
        r#"
        [networks.staging]
        url = "https://staging.example/${XENRENA_TEST_DOTENV_TOKEN}"
        accounts = ["0x01"]
        "#,
    )?;
    fs::write(dir.path().join(".env"), "XENRENA_TEST_DOTENV_TOKEN=s3cret\n")?;

    let config = ProjectConfig::load_with_dotenv(&path)?;
    let staging = config.resolve_network("staging")?;
    assert_eq!(staging.url, "https://staging.example/s3cret");
    Ok(())
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProjectConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read(_)));
}

#[test]
fn missing_file_falls_back_to_defaults() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = ProjectConfig::load_or_default(&dir.path().join("xenrena.toml"))?;
    assert_eq!(config, ProjectConfig::default());
    Ok(())
}

#[test]
fn present_file_is_loaded_over_defaults() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("xenrena.toml");
    fs::write(
        &path,
        r#"
        [solidity]
        version = "0.8.24"
        optimizer = { enabled = true, runs = 1000 }
        "#,
    )?;

    let config = ProjectConfig::load_or_default(&path)?;
    assert_eq!(config.solidity.version, "0.8.24");
    assert_eq!(config.solidity.optimizer.runs, 1000);
    assert_eq!(config.root, dir.path());
    assert!(config.networks.contains_key(LOCAL_NETWORK));
    Ok(())
}
