//! Diagen CLI - Render architecture diagrams from JSON specifications

mod cli;
mod colorizer;

use clap::Parser;
use tracing::debug;

fn main() {
    let cli_args = cli::Cli::parse();

    // Logging comes first so config loading is traced
    cli::init_cli_logging(&cli_args);

    let app = match cli::DiagenApp::from_cli(&cli_args) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    debug!(version = env!("CARGO_PKG_VERSION"), "Starting diagen");

    if let Err(e) = app.run(cli_args.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
