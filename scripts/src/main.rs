use std::{io, path::Path, process};

use clap::Parser;
use scripts::{
    cli::{Cli, Command},
    constants::DEFAULT_LOG_FILTER,
    deploy::exit_status,
    errors::ScriptError,
};
use tracing_subscriber::EnvFilter;
use xenrena_config::ProjectConfig;

#[tokio::main]
async fn main() {
    let Cli {
        config,
        network,
        command,
    } = Cli::parse();

    // Logs go to stderr, leaving stdout to the scripts' output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let result = run(&config, &network, command).await;
    process::exit(exit_status(&result, &mut io::stderr()));
}

async fn run(config_path: &Path, network: &str, command: Command) -> Result<(), ScriptError> {
    let config = ProjectConfig::load_or_default(config_path)?;
    command.run(&config, network).await
}
