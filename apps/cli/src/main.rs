//! GitDocx CLI: render a GitHub repository folder into Word documents.
//!
//! Walks the folder through the GitHub contents API, downloads every file
//! with a selected extension and writes one `.docx` per containing folder.

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
