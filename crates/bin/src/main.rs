use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("firetree=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format);

    match &cli.command {
        Commands::Parse(args) => commands::parse::run(args, format),
        Commands::Watch(args) => commands::watch::run(args, format).await,
        Commands::Reduce(args) => commands::reduce::run(args, format),
    }
}
