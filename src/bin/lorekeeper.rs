//! Lorekeeper CLI binary.

use std::process;

use clap::Parser;
use lorekeeper::cli::{args::*, commands::*};
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse command line arguments using clap
    let args = LorekeeperArgs::parse();

    // LOREKEEPER_LOG overrides the level picked from the verbosity flags
    let default_level = match args.verbosity() {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("LOREKEEPER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("lorekeeper={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Execute the command
    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
