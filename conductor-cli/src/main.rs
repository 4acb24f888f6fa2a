//! Conductor: sequential component bootstrap CLI.
//!
//! # Usage
//!
//! ```text
//! conductor run <manifest> [--json] [--no-teardown]
//! conductor validate <manifest> [--json]
//! conductor inspect <manifest>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{inspect::InspectArgs, run::RunArgs, validate::ValidateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "conductor",
    version,
    about = "Load a manifest of components one at a time and report the outcome",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load every component of a manifest, streaming progress.
    Run(RunArgs),

    /// Check a manifest for configuration errors without loading anything.
    Validate(ValidateArgs),

    /// Load a manifest and print the resulting directory snapshot as JSON.
    Inspect(InspectArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Validate(args) => args.run(),
        Commands::Inspect(args) => args.run(),
    }
}
