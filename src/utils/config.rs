//! Configuration management for ruwc
//!
//! Provides hierarchical configuration loading from multiple sources:
//! System -> User -> Project -> explicit file -> CLI arguments
//!
//! Each file only needs the keys it wants to change; tables are merged key
//! by key before the result is deserialized.

use crate::cli::parser::parse_buffer_size;
use crate::error::{Result, RuwcError};
use crate::threading::{CountConfig, ShutdownPolicy, Strategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Counting settings
    pub count: CountSection,
    /// Output settings
    pub output: OutputSection,
}

/// Counting configuration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CountSection {
    /// Number of worker threads (0 = auto-detect)
    pub threads: usize,
    /// Bytes per buffer unit, with optional K/M/G suffix
    pub buffer_size: String,
    pub strategy: Strategy,
    pub shutdown: ShutdownPolicy,
    /// Sleep between claim attempts for the polling strategy
    pub poll_interval_ms: u64,
}

/// Available output formats
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output for scripting
    Json,
    /// Just the number
    Minimal,
}

/// Output configuration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSection {
    pub format: OutputFormat,
    /// Log level used when no `-v`/`-q` is given
    pub verbose_level: String,
    /// Color output
    pub color_output: bool,
    /// Show a progress bar on terminals
    pub progress: bool,
}

impl Default for CountSection {
    fn default() -> Self {
        Self {
            threads: 0,
            buffer_size: "1MiB".to_string(),
            strategy: Strategy::default(),
            shutdown: ShutdownPolicy::default(),
            poll_interval_ms: 1,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            verbose_level: "warn".to_string(),
            color_output: true,
            progress: false,
        }
    }
}

impl Config {
    /// Turn the counting section into a validated [`CountConfig`]
    pub fn count_config(&self) -> Result<CountConfig> {
        let capacity = parse_buffer_size(&self.count.buffer_size)?;
        let config = match self.count.threads {
            0 => CountConfig::new().with_auto_workers(),
            threads => CountConfig::new().with_workers(threads),
        };
        let config = config
            .with_buffer_capacity(capacity)
            .with_strategy(self.count.strategy)
            .with_shutdown(self.count.shutdown)
            .with_poll_interval(Duration::from_millis(self.count.poll_interval_ms))
            .with_progress(self.output.progress);
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.output.verbose_level.as_str()) {
            return Err(RuwcError::config_error(
                format!(
                    "Invalid verbose level: {} (must be one of: {})",
                    self.output.verbose_level,
                    valid_levels.join(", ")
                ),
                None,
            ));
        }

        self.count_config().map_err(|e| {
            RuwcError::config_error(format!("Invalid count settings: {}", e), None)
        })?;
        Ok(())
    }
}

/// Configuration builder that loads from multiple sources
pub struct ConfigBuilder {
    table: toml::Table,
    sources: Vec<PathBuf>,
}

impl ConfigBuilder {
    /// Create a new configuration builder with defaults
    pub fn new() -> Self {
        Self {
            table: toml::Table::new(),
            sources: Vec::new(),
        }
    }

    /// Load system-wide configuration
    pub fn load_system_config(self) -> Result<Self> {
        self.load_optional(get_system_config_path(), "system")
    }

    /// Load user configuration
    pub fn load_user_config(self) -> Result<Self> {
        self.load_optional(get_user_config_path(), "user")
    }

    /// Load project-specific configuration
    pub fn load_project_config(self) -> Result<Self> {
        self.load_optional(get_project_config_path(), "project")
    }

    /// Load a file named on the command line; unlike the other layers it
    /// must exist
    pub fn load_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let table = load_config_table(path)?;
        merge_tables(&mut self.table, table);
        self.sources.push(path.to_path_buf());
        tracing::debug!("Loaded config from: {}", path.display());
        Ok(self)
    }

    fn load_optional(self, path: Option<PathBuf>, layer: &str) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                tracing::debug!("Loading {} config", layer);
                self.load_file(path)
            }
            _ => Ok(self),
        }
    }

    /// Files merged so far, in load order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Build the final configuration
    pub fn build(self) -> Result<Config> {
        let config = toml::Value::Table(self.table).try_into::<Config>().map_err(|e| {
            RuwcError::config_error(
                format!("Failed to parse configuration: {}", e),
                self.sources.last().cloned(),
            )
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Load every default layer that exists, then `explicit` if given
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut builder = ConfigBuilder::new()
        .load_system_config()?
        .load_user_config()?
        .load_project_config()?;
    if let Some(path) = explicit {
        builder = builder.load_file(path)?;
    }
    builder.build()
}

/// Load a single TOML file as a raw table
fn load_config_table<P: AsRef<Path>>(path: P) -> Result<toml::Table> {
    let content = std::fs::read_to_string(&path).map_err(|e| {
        RuwcError::io_error(
            format!("Failed to read config file: {}", path.as_ref().display()),
            e,
        )
    })?;

    content.parse::<toml::Table>().map_err(|e| {
        RuwcError::config_error(
            format!("Failed to parse config file: {}", e),
            Some(path.as_ref().to_path_buf()),
        )
    })
}

/// Merge `overlay` into `base`; nested tables merge, everything else replaces
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

/// Get system-wide configuration path
fn get_system_config_path() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        Some(PathBuf::from("/etc/ruwc/config.toml"))
    }
    #[cfg(windows)]
    {
        std::env::var("PROGRAMDATA")
            .ok()
            .map(|pd| PathBuf::from(pd).join("ruwc").join("config.toml"))
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}

/// Get user-specific configuration path
fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ruwc").join("config.toml"))
}

/// Get project-specific configuration path
fn get_project_config_path() -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    Some(current_dir.join(".ruwc.toml"))
}

/// Save configuration to file
pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| RuwcError::config_error(format!("Failed to serialize config: {}", e), None))?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            RuwcError::io_error(
                format!("Failed to create config directory: {}", parent.display()),
                e,
            )
        })?;
    }

    std::fs::write(&path, content).map_err(|e| {
        RuwcError::io_error(
            format!("Failed to write config file: {}", path.as_ref().display()),
            e,
        )
    })?;

    tracing::info!("Saved configuration to: {}", path.as_ref().display());
    Ok(())
}
