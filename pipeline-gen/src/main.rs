// pipeline-gen
// Builds the example CI workflow and writes the parent and child documents

mod commands;
mod data;
mod example;
mod fetch;
mod output;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Generate multi-pipeline CI configuration from a data file
#[derive(Parser, Debug)]
#[command(name = "pipeline-gen", version, about)]
struct Cli {
    /// Log render progress at debug level
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the parent workflow and every child pipeline
    Generate(commands::generate::GenerateArgs),
    /// Render the standalone deploy pipeline
    Deploy(commands::deploy::DeployArgs),
    /// Check the example workflow for dangling references and naming problems
    Validate(commands::validate::ValidateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pipeline_gen=debug,pipeline_builder=debug"
    } else {
        "pipeline_gen=info,pipeline_builder=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args).await,
        Commands::Deploy(args) => commands::deploy::execute(args),
        Commands::Validate(args) => commands::validate::execute(args).await,
    }
}
