//! Command implementations for ruwc

use crate::cli::completion::{generate_completion, install_completion};
use crate::cli::parser::{parse_buffer_size, parse_thread_count, validate_cli_path};
use crate::cli::Cli;
use crate::error::Result;
use crate::threading::{CountReport, DelimiterCounter, ShutdownPolicy, Strategy};
use crate::utils::{format_count, format_duration, format_size, Config, OutputFormat};
use clap::Args;
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};

const BIN_NAME: &str = "ruwc";

/// Count newline bytes in a file
#[derive(Args, Debug)]
pub struct CountCommand {
    /// File to count
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Worker threads (0 or "auto" = one per CPU)
    #[arg(short = 't', long, value_parser = parse_thread_count)]
    pub threads: Option<usize>,

    /// Bytes per buffer unit, e.g. 256K or 4MiB
    #[arg(short = 'b', long, value_parser = parse_buffer_size)]
    pub buffer_size: Option<usize>,

    /// How idle threads wait for work
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// What happens to in-flight buffers when input ends
    #[arg(long)]
    pub shutdown: Option<ShutdownPolicy>,

    /// Sleep between attempts for the polling strategy
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,
}

/// Completion command for generating shell completions
#[derive(Args, Debug)]
pub struct CompletionCommand {
    /// Shell type
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,

    /// Write the script to the shell's completion directory instead of stdout
    #[arg(long)]
    pub install: bool,
}

/// Machine-readable result of a count, as printed by `--output-format json`
#[derive(Debug, Serialize)]
pub struct CountOutput {
    pub file: String,
    pub lines: u64,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub bytes: u64,
    pub workers: usize,
    pub buffer_units: usize,
    pub unit_capacity: usize,
    pub strategy: String,
    pub elapsed_ms: u64,
    pub starving_ms: u64,
    pub resting_ms: u64,
    pub throughput_mib_s: f64,
}

impl CountOutput {
    pub fn from_report(path: &Path, report: &CountReport) -> Self {
        let stats = &report.stats;
        Self {
            file: path.display().to_string(),
            lines: report.total,
            complete: report.is_complete(),
            error: report.error.as_ref().map(|e| e.to_string()),
            bytes: stats.bytes_read,
            workers: stats.workers,
            buffer_units: stats.pool_units,
            unit_capacity: stats.unit_capacity,
            strategy: stats.strategy.to_string(),
            elapsed_ms: stats.elapsed.as_millis() as u64,
            starving_ms: stats.starving.as_millis() as u64,
            resting_ms: stats.resting.as_millis() as u64,
            throughput_mib_s: stats.throughput_mib_per_sec(),
        }
    }
}

impl CountCommand {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, cli: &Cli, config: &mut Config) {
        if let Some(threads) = self.threads {
            config.count.threads = threads;
        }
        if let Some(size) = self.buffer_size {
            config.count.buffer_size = size.to_string();
        }
        if let Some(strategy) = self.strategy {
            config.count.strategy = strategy;
        }
        if let Some(shutdown) = self.shutdown {
            config.count.shutdown = shutdown;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.count.poll_interval_ms = ms;
        }
        if cli.progress {
            config.output.progress = true;
        }
    }

    pub fn execute(&self, cli: &Cli, config: &Config) -> Result<()> {
        validate_cli_path(&self.file.to_string_lossy())?;

        let mut config = config.clone();
        self.apply_overrides(cli, &mut config);
        let count_config = config.count_config()?;
        let format = cli.output_format.unwrap_or(config.output.format);
        // A progress bar would interleave with JSON consumers reading stderr
        let count_config = count_config.with_progress(config.output.progress && format != OutputFormat::Json);

        tracing::info!(
            threads = count_config.effective_workers(),
            buffer = %format_size(count_config.buffer_capacity as u64),
            strategy = %count_config.strategy,
            shutdown = %count_config.shutdown,
            "Starting line count"
        );

        let counter = DelimiterCounter::new(count_config)?;
        let report = counter.count_file(&self.file)?;
        let output = CountOutput::from_report(&self.file, &report);

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Minimal => {
                println!("{}", output.lines);
            }
            OutputFormat::Human => {
                let colored = config.output.color_output && console::colors_enabled();
                print_human(&output, colored);
                if cli.verbose > 0 {
                    print_summary(&report, colored);
                }
            }
        }

        match report.error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

fn print_human(output: &CountOutput, colored: bool) {
    let count = format_count(output.lines);
    if colored {
        println!("{} {}", style(count).bold(), output.file);
    } else {
        println!("{} {}", count, output.file);
    }
    if !output.complete {
        let note = if output.error.is_some() {
            "count is partial: input ended with an error"
        } else {
            "count is partial: some filled buffers were not scanned before shutdown"
        };
        if colored {
            eprintln!("{}", style(note).yellow());
        } else {
            eprintln!("{}", note);
        }
    }
}

fn print_summary(report: &CountReport, colored: bool) {
    let stats = &report.stats;
    let heading = "Summary";
    if colored {
        eprintln!("{}", style(heading).cyan().bold());
    } else {
        eprintln!("{}", heading);
    }
    eprintln!("  Read:       {}", format_size(stats.bytes_read));
    eprintln!(
        "  Workers:    {} ({} units of {})",
        stats.workers,
        stats.pool_units,
        format_size(stats.unit_capacity as u64)
    );
    eprintln!("  Strategy:   {}", stats.strategy);
    eprintln!("  Elapsed:    {}", format_duration(stats.elapsed));
    eprintln!("  Throughput: {:.1} MiB/s", stats.throughput_mib_per_sec());
    eprintln!("  Starving:   {}", format_duration(stats.starving));
    eprintln!("  Resting:    {}", format_duration(stats.resting));
    if stats.stranded_units() > 0 {
        eprintln!("  Stranded:   {} units", stats.stranded_units());
    }
}

impl CompletionCommand {
    pub fn execute(&self, _cli: &Cli) -> Result<()> {
        if self.install {
            return install_completion(self.shell, BIN_NAME);
        }
        let mut stdout = std::io::stdout();
        generate_completion(self.shell, &mut stdout, BIN_NAME)
    }
}
