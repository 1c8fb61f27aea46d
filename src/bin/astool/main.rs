//! astool CLI - export, deployment, and manifest tooling for Automation
//! Studio projects.

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
        EnvFilter::new("astool=debug")
    } else {
        EnvFilter::new("astool=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Export(args) => commands::export::execute(args),
        Commands::Deploy(args) => commands::deploy::execute(args),
        Commands::Sync(args) => commands::sync::execute(args),
        Commands::Configs(args) => commands::configs::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
