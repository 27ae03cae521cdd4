use clap::Parser;

use caja_api::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // CLI output goes to stdout; keep tracing on stderr and quiet by
    // default so JSON output stays parseable.
    if std::env::var("CLI_VERBOSE").is_ok() {
        tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    }

    let cli = Cli::parse();

    if let Err(e) = cli::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
