//! koaton CLI: bundle CSS and JS assets for a project.
//!
//! Development builds write one unminified file per source; production
//! builds write one minified, content-addressed file per bundle.

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
