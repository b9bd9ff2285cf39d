//! Command Line Interface for ruwc
//!
//! This module provides the CLI: argument parsing, command execution and
//! shell completion generation.

pub mod commands;
pub mod completion;
pub mod parser;

pub use commands::*;
pub use parser::*;

pub use crate::utils::OutputFormat;

use crate::error::Result;
use crate::utils::Config;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// ruwc - parallel line counter
#[derive(Parser, Debug)]
#[command(
    name = "ruwc",
    version = env!("CARGO_PKG_VERSION"),
    about = "Count lines in very large files using all cores",
    long_about = "ruwc reads a file sequentially into a pool of buffers while worker \
                  threads count newline bytes in parallel.\n\n\
                  EXAMPLES:\n  \
                  ruwc count big.log                         # Count lines\n  \
                  ruwc count -t 8 -b 4MiB big.log            # 8 workers, 4 MiB buffers\n  \
                  ruwc --output-format minimal c big.log     # Just the number\n\n\
                  Use 'ruwc <command> --help' for detailed command options.",
    author = "Fabian Schmieder",
    after_help = "For more information about a specific command, use 'ruwc <command> --help'."
)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose", action = ArgAction::SetTrue)]
    pub quiet: bool,

    /// Output format (defaults to the configured one, else human)
    #[arg(long, global = true, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable progress bar
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub progress: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count newline bytes in a file
    #[command(name = "count", alias = "c")]
    Count(CountCommand),

    /// Generate shell completions (bash, zsh, fish, powershell, elvish)
    #[command(name = "completion")]
    Completion(CompletionCommand),

    /// Show version information
    #[command(name = "version")]
    Version,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Execute the parsed command
    pub fn execute(&self, config: &Config) -> Result<()> {
        match &self.command {
            Commands::Count(cmd) => cmd.execute(self, config),
            Commands::Completion(cmd) => cmd.execute(self),
            Commands::Version => self.show_version(config),
        }
    }

    /// Show version information
    fn show_version(&self, config: &Config) -> Result<()> {
        let info = crate::utils::version_info();
        match self.output_format.unwrap_or(config.output.format) {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "name": info.name,
                    "version": info.version,
                    "target": info.target,
                    "default_workers": info.cpus,
                });
                println!("{}", serde_json::to_string(&json)?);
            }
            OutputFormat::Minimal => println!("{}", info.version),
            OutputFormat::Human => {
                if self.verbose > 0 {
                    println!("{}", info);
                } else {
                    println!("{} {}", info.name, info.version);
                }
            }
        }
        Ok(())
    }
}
