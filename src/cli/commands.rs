//! CLI command definitions

use clap::Args;

/// Run the pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to the requirements text file
    #[arg(short, long)]
    pub input: String,

    /// Path to a stage configuration YAML file
    #[arg(short, long)]
    pub stages: Option<String>,

    /// Path to the pi executable
    #[arg(long)]
    pub agent: Option<String>,

    /// Write the model to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Pretty-print the model JSON
    #[arg(long)]
    pub pretty: bool,
}

/// Validate a stage configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to a stage configuration YAML file
    #[arg(short, long)]
    pub stages: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
