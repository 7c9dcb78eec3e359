//! Drydock CLI - static dependency discovery for R projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("drydock=debug")
    } else {
        EnvFilter::new("drydock=info")
    };

    // Logs go to stderr; stdout carries only the command's result
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let color = !cli.no_color;

    // Execute command
    match cli.command {
        Commands::Discover(args) => commands::discover::execute(args, color),
        Commands::Sources(args) => commands::sources::execute(args, color),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
