use boardsync::cli::commands::Cli;
use boardsync::cli::handlers;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays clean for --json. RUST_LOG wins over -v.
fn setup_logging(verbose: bool) {
    let default = if verbose { "boardsync=debug" } else { "boardsync=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = handlers::dispatch(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
