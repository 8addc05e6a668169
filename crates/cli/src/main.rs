//! pstore - folder-oriented client for S3-compatible object storage

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pathstore_cli::commands::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --debug wins over RUST_LOG; otherwise only warnings reach stderr
    let filter = if cli.debug {
        EnvFilter::new("ps_core=debug,ps_s3=debug,pathstore_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
