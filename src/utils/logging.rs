//! Logging infrastructure for ruwc
//!
//! Structured logging with tracing. Everything goes to stderr (or a log
//! file) so stdout only ever carries the count.

use crate::error::{Result, RuwcError};
use std::error::Error;
use std::io;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level
    pub level: Level,
    /// Enable JSON output
    pub json_format: bool,
    /// Enable colored output
    pub colored: bool,
    /// Include file and line information
    pub include_location: bool,
    /// Include target module information
    pub include_target: bool,
    /// Span events to log
    pub span_events: FmtSpan,
    /// Log to file
    pub log_file: Option<std::path::PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            colored: true,
            include_location: false,
            include_target: false,
            span_events: FmtSpan::NONE,
            log_file: None,
        }
    }
}

/// Map `-v`/`-q` to a level: quiet is errors only, each `-v` steps up from
/// warnings.
pub fn verbosity_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialize logging with the given configuration
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();

    let to_terminal = config.log_file.is_none();
    let writer = match config.log_file {
        Some(ref log_file) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .map_err(|e| {
                    RuwcError::io_error(format!("Failed to open log file: {}", log_file.display()), e)
                })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::stderr),
    };

    let layer = if config.json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(config.span_events)
            .with_writer(writer)
            .boxed()
    } else {
        let ansi = config.colored && to_terminal && atty::is(atty::Stream::Stderr);
        tracing_subscriber::fmt::layer()
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(config.span_events)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| {
            RuwcError::internal_error(format!("Failed to initialize logging: {}", e), Some(file!()))
        })?;

    tracing::debug!("Logging initialized");
    Ok(())
}

/// Initialize simple logging for tests
pub fn init_test_logging() -> Result<()> {
    let config = LoggingConfig {
        level: Level::DEBUG,
        json_format: false,
        colored: false,
        include_location: true,
        include_target: true,
        span_events: FmtSpan::NONE,
        log_file: None,
    };

    init_logging(config)
}

/// Parse log level from string
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" | "warning" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(RuwcError::invalid_configuration(
            format!("Invalid log level: {}", level_str),
            Some(level_str.to_string()),
        )),
    }
}

/// Create a performance measurement span
pub fn perf_span(name: &'static str) -> tracing::Span {
    tracing::info_span!("perf", name = name)
}

/// Log how long an operation took and, when known, its throughput
pub fn log_performance(operation: &str, duration: std::time::Duration, bytes_processed: Option<u64>) {
    match bytes_processed {
        Some(bytes) => tracing::info!(
            operation,
            duration_ms = duration.as_millis() as u64,
            bytes,
            throughput_mib_s = crate::utils::throughput_mib_per_sec(bytes, duration),
            "Performance: {} completed in {}",
            operation,
            crate::utils::format_duration(duration)
        ),
        None => tracing::info!(
            operation,
            duration_ms = duration.as_millis() as u64,
            "Performance: {} completed in {}",
            operation,
            crate::utils::format_duration(duration)
        ),
    }
}

/// Log an error with its category and full source chain
pub fn log_error(error: &RuwcError, context: Option<&str>) {
    tracing::error!(
        category = error.category(),
        recoverable = error.is_recoverable(),
        context = context.unwrap_or(""),
        "Error occurred: {}",
        error
    );

    let mut source = error.source();
    let mut level = 1;
    while let Some(err) = source {
        tracing::error!("  Caused by (level {}): {}", level, err);
        source = err.source();
        level += 1;
    }
}

/// Macro for creating timed spans
#[macro_export]
macro_rules! timed_operation {
    ($name:expr, $block:expr) => {{
        let _span = $crate::utils::logging::perf_span($name).entered();
        let start = std::time::Instant::now();
        let result = $block;
        let duration = start.elapsed();
        $crate::utils::logging::log_performance($name, duration, None);
        result
    }};
    ($name:expr, $bytes:expr, $block:expr) => {{
        let _span = $crate::utils::logging::perf_span($name).entered();
        let start = std::time::Instant::now();
        let result = $block;
        let duration = start.elapsed();
        $crate::utils::logging::log_performance($name, duration, Some($bytes));
        result
    }};
}
