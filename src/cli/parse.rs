//! CLI parse: clap types for pageshell. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pageshell CLI - headless page and dialog sessions
#[derive(Parser)]
#[command(name = "pageshell")]
#[command(about = "Run scripted page, navigation and dialog sessions against a headless shell")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a session script
    Run {
        /// Path to the TOML script
        script: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Disable colored text output
        #[arg(long)]
        no_color: bool,
    },
    /// Load, validate and print the effective configuration
    CheckConfig {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

impl Commands {
    /// Command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Run { .. } => "run",
            Commands::CheckConfig { .. } => "check-config",
        }
    }
}
