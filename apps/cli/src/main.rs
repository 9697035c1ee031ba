//! kbsync CLI — synchronizes local documentation files with the remote
//! knowledge base (vector store + file storage) used by a hosted assistant.

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
