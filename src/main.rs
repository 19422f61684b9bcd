use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod config;
pub mod exporter;
pub mod hooks;
pub mod resources;
pub mod writer;

use cli::{Cli, Commands};
use config::Options;
use exporter::ResourceExporter;
use resources::CloudFormation;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), exporter::Error> {
    let options = cli.options();

    match cli.command {
        Commands::Hooks => {
            for event in hooks::DEPLOY_EVENTS {
                println!("{}", event);
            }
        }
        Commands::Export => {
            let exporter =
                build_exporter(options, cli.service_path, cli.config, cli.config_stage).await?;
            exporter.export_resources().await?;
        }
        Commands::Hook { event } => {
            let exporter =
                build_exporter(options, cli.service_path, cli.config, cli.config_stage).await?;
            let registry = hooks::register_exporter(Arc::new(exporter));
            match registry.invoke(&event).await {
                Some(result) => {
                    result?;
                }
                None => info!(event = %event, "Nothing to do for this event"),
            }
        }
    }

    return Ok(());
}

/// Loads the service configuration, then the SDK client for its region.
async fn build_exporter(
    options: Options,
    service_path: PathBuf,
    config_path: Option<PathBuf>,
    config_stage: Option<String>,
) -> Result<ResourceExporter<CloudFormation>, exporter::Error> {
    let host_config = config::load(service_path, config_path, config_stage)?;

    let region = options
        .region
        .clone()
        .or_else(|| host_config.service.provider.region.clone());
    let source = CloudFormation::new(region).await;

    return Ok(ResourceExporter::new(options, host_config, source));
}
