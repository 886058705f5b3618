//! PartnerScout CLI — partner discovery and competitive scoring.
//!
//! Searches an industry for companies, scores them against the current
//! partner roster, and saves the viable ones as potential partners.

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
