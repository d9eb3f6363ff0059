//! MadForge CLI: convert parsed documents into MAD bundles.
//!
//! A bundle holds the document's structured content, a derived entity graph,
//! optional embeddings, a content hash, and a script that rebuilds the
//! document in the MAD runtime.

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
