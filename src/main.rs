use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod api;
mod budget;
mod cli;
mod command;
mod config;
mod conversation;
mod credentials;
mod domain;
mod prompt;
mod ranking;
mod stream;
mod workspace;
mod writer;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.take() {
        Some(Commands::Preview {
            dir,
            ignore,
            max_file_size,
            verbose,
        }) => command::run_preview(dir, ignore, max_file_size, verbose),
        Some(Commands::Models { filter }) => command::run_models(filter),
        None => command::run_build(cli).await,
    }
}
