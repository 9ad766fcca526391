mod cli;
mod commands;
mod config;
mod error;
mod logger;
mod managers;

use clap::Parser;
use dotenvy::dotenv;

use crate::{cli::Cli, config::AppPaths};

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    let config = config::initialize_configuration(cli.config.as_deref());
    logger::initialize(&config.logger, &config.telemetry);
    tracing::debug!(environment = %config.environment, "Configuration loaded");

    let paths = AppPaths::from_root(config.app_data_path.clone());
    let managers = managers::initialize(&config, &paths).await;

    if let Err(error) = commands::run(cli.command, &managers).await {
        tracing::debug!(error = ?error, "Command failed");
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
