//! ruwc - parallel line counter
//!
//! Main entry point for the ruwc command-line application.

use ruwc::cli::{Cli, OutputFormat};
use ruwc::error::Result;
use ruwc::utils::config::{load_config, Config};
use ruwc::utils::logging::{init_logging, parse_log_level, verbosity_level, LoggingConfig};
use std::error::Error;
use std::process;

fn main() {
    let exit_code = match run() {
        Ok(()) => 0,
        Err(error) => {
            ruwc::utils::logging::log_error(&error, Some("main"));

            // Always print to stderr in case logging is not up
            eprintln!("Error: {}", error);

            let mut source = error.source();
            let mut level = 1;
            while let Some(err) = source {
                eprintln!("  Caused by ({}): {}", level, err);
                source = err.source();
                level += 1;
            }

            error.exit_code()
        }
    };

    process::exit(exit_code);
}

/// Main application logic
fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = load_config(cli.config.as_deref())?;

    setup_logging(&cli, &config)?;

    tracing::debug!("CLI arguments parsed: {:?}", cli);
    cli.execute(&config)
}

/// Setup logging based on CLI flags, falling back to the configured level
fn setup_logging(cli: &Cli, config: &Config) -> Result<()> {
    init_logging(logging_config(cli, config)?)
}

/// Level and format for the run: `-v`/`-q` win over the config file
fn logging_config(cli: &Cli, config: &Config) -> Result<LoggingConfig> {
    let level = if cli.quiet || cli.verbose > 0 {
        verbosity_level(cli.verbose, cli.quiet)
    } else {
        parse_log_level(&config.output.verbose_level)?
    };
    let format = cli.output_format.unwrap_or(config.output.format);

    Ok(LoggingConfig {
        level,
        json_format: format == OutputFormat::Json,
        colored: config.output.color_output && format != OutputFormat::Json,
        include_location: cli.verbose > 2,
        include_target: cli.verbose > 1,
        span_events: if cli.verbose > 2 {
            tracing_subscriber::fmt::format::FmtSpan::ENTER | tracing_subscriber::fmt::format::FmtSpan::EXIT
        } else {
            tracing_subscriber::fmt::format::FmtSpan::NONE
        },
        log_file: None,
    })
}
