mod cli;
mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quilt=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Info(args) => commands::info::run(args, cli.format),
        Commands::Dump(args) => commands::dump::run(args, cli.format),
        Commands::Log(args) => commands::log::run(args, cli.format),
        Commands::Put(args) => commands::put::run(args, cli.format),
        Commands::Merge(args) => commands::merge::run(args, cli.format),
        Commands::Sync(args) => commands::sync::run(args, cli.format),
    }
}
