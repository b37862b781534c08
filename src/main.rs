mod auth;
mod cli;
mod config;
mod error;
mod metrics;
mod output;
mod pagination;
mod providers;
mod window;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting engmetrics");
    cli.execute().await?;

    Ok(())
}
