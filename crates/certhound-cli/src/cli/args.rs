//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Certificate audit for container image tar exports.
#[derive(Parser)]
#[command(name = "certhound", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Pretty
    )]
    pub output: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all certificate authorities found in the given image export
    Inspect(InspectArgs),

    /// Validate found certificates against a trust policy
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    /// Path to the image's exported tar stream (flattened filesystem)
    pub archive: PathBuf,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the image's exported tar stream (flattened filesystem)
    pub archive: PathBuf,

    /// Trust policy configuration file
    #[arg(short, long, default_value = ".certhound.yaml")]
    pub config: PathBuf,

    /// Allow any certificate that is not otherwise forbidden,
    /// overriding the policy's allow list
    #[arg(long)]
    pub permissive: bool,

    /// Suppress the nonzero exit code on validation failure
    #[arg(long)]
    pub warn: bool,
}
