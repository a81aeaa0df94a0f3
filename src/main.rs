//! testkit - client bootstrap for UI and performance test daemons

use std::path::PathBuf;

use clap::Parser;
use testkit::commands::Commands;
use testkit::common::{config::Config, logging};
use testkit::cli;

#[derive(Parser)]
#[command(name = "testkit", about = "Bootstrap test automation daemons")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to the data directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Held until exit so file logs are flushed
    let log_guard = if cli.log_file {
        logging::init_file().map(|(path, guard)| {
            tracing::debug!(path = %path.display(), "Logging to file");
            guard
        })
    } else {
        logging::init_cli();
        None
    };

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let result = match config {
        Ok(config) => cli::dispatch(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        drop(log_guard);
        std::process::exit(1);
    }
}
