use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use boutique_ledger::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "boutique_ledger=debug" } else { "boutique_ledger=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    cli.run().await
}
