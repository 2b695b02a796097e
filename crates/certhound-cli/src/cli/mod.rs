//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let ctx = commands::Context {
        output_format: cli.output,
    };

    match cli.command {
        Commands::Inspect(args) => commands::inspect::execute(&ctx, args).await,
        Commands::Validate(args) => commands::validate::execute(&ctx, args).await,
    }
}
