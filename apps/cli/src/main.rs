//! docingest CLI: document-type-aware Markdown chunking.
//!
//! Classifies normalized Markdown documents and splits them into chunk lists
//! ready for embedding, one JSON file per document.

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
