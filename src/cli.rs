use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Options;

/// Write the resource ids of a service's CloudFormation stack to a local file.
#[derive(Parser, Debug)]
#[command(name = "cfn-resources-env")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Stage to resolve the stack for. Takes precedence over every other stage.
    #[arg(short, long, global = true)]
    pub stage: Option<String>,

    /// Stage configured by the deployment host.
    #[arg(long, global = true, env = "SERVERLESS_STAGE", hide = true)]
    pub config_stage: Option<String>,

    /// AWS region, overriding `provider.region`.
    #[arg(short, long, global = true)]
    pub region: Option<String>,

    /// Service directory the resources file is written to.
    #[arg(long, global = true, default_value = ".")]
    pub service_path: PathBuf,

    /// Service configuration file (defaults to `serverless.yml` in the service path).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the stack resources and write them right away.
    Export,

    /// Run the handler bound to a lifecycle event.
    Hook {
        /// Lifecycle event name, e.g. `before:deploy:createDeploymentArtifacts`.
        event: String,
    },

    /// List the lifecycle events a handler is bound to.
    Hooks,
}

impl Cli {
    pub fn options(&self) -> Options {
        Options {
            stage: self.stage.clone(),
            region: self.region.clone(),
        }
    }
}
