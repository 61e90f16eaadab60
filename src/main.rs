//! Stagehand CLI — declarative game installer.

use clap::Parser;
use stagehand::cli::Cli;

fn main() {
    stagehand::logging::init();
    let cli = Cli::parse();
    if let Err(e) = stagehand::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
