//! scriptwatch CLI — registry and content synchronization for remote
//! JavaScript files.
//!
//! Runs the HTTP API server and offers direct registry operations against
//! the local store.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
