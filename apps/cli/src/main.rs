//! docbridge CLI: documentation Deploy API tools for AI assistants.
//!
//! Runs the stdio tool server and offers one-shot search, content and
//! portal-URL commands for checking a deployment from the terminal.

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
