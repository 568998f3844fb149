//! blobsync - Storage Account Mirror Tool
//!
//! Mirrors every container of an Azure storage account to local
//! directories via azcopy, authenticated through Key Vault with a
//! certificate-backed service principal.

use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blobsync::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = cli.execute().await {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Progress messages go to standard output; `--verbose` raises the level
/// to debug and `RUST_LOG` overrides both.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "blobsync=debug"
    } else {
        "blobsync=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();
}
