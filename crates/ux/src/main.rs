//! UX CLI - `UMLet` diagram conversion.
//!
//! Provides commands for:
//! - `convert`: Convert one diagram and print the cached image path
//! - `build`: Convert every diagram under the source root into the output tree

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, ConvertArgs};
use output::Output;

/// UX - `UMLet` diagram conversion with caching.
#[derive(Parser)]
#[command(name = "ux", version, about)]
struct Cli {
    /// Enable verbose output (log every conversion).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single diagram.
    Convert(ConvertArgs),
    /// Convert all diagrams for a builder.
    Build(BuildArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert(args) => args.execute(),
        Commands::Build(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
