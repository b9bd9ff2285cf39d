//! Error handling for RuWC
//!
//! Error types with context preservation and chain support. Every error
//! carries a category and maps to a process exit code so the CLI layer can
//! report a status without inspecting variants itself.

use crate::memory::UnitStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for RuWC operations
pub type Result<T> = std::result::Result<T, RuwcError>;

/// Error type for all RuWC operations
#[derive(Error, Debug)]
pub enum RuwcError {
    /// The input file could not be opened
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read from the input failed after counting started
    #[error("Read error after {bytes_read} bytes: {message}")]
    Read {
        message: String,
        bytes_read: u64,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread could not be created
    #[error("Failed to spawn worker {worker}: {source}")]
    ThreadSpawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread could not be joined (it panicked)
    #[error("Failed to join worker {worker}: {message}")]
    ThreadJoin { worker: usize, message: String },

    /// Rejected counting parameters
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
        input: Option<String>,
    },

    /// A buffer unit was observed in a status that the caller did not own
    #[error("Buffer unit {index} is {found}, expected {expected}")]
    UnitState {
        index: usize,
        expected: UnitStatus,
        found: UnitStatus,
    },

    /// Generic I/O errors outside the counting pipeline
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CLI argument parsing errors
    #[error("CLI error: {message}")]
    Cli {
        message: String,
        #[source]
        source: Option<clap::Error>,
    },

    /// Configuration file errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        file_path: Option<PathBuf>,
    },

    /// Internal errors (should not normally occur)
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        location: Option<&'static str>,
    },
}

impl RuwcError {
    /// Create an open failure for the given path
    pub fn open_error<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Create a read failure, remembering how far the producer got
    pub fn read_error<S: Into<String>>(message: S, bytes_read: u64, source: std::io::Error) -> Self {
        Self::Read {
            message: message.into(),
            bytes_read,
            source,
        }
    }

    /// Create a worker spawn failure
    pub fn thread_spawn_error(worker: usize, source: std::io::Error) -> Self {
        Self::ThreadSpawn { worker, source }
    }

    /// Create a worker join failure
    pub fn thread_join_error<S: Into<String>>(worker: usize, message: S) -> Self {
        Self::ThreadJoin {
            worker,
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration<S: Into<String>>(message: S, input: Option<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
            input,
        }
    }

    /// Create a unit state violation
    pub fn unit_state(index: usize, expected: UnitStatus, found: UnitStatus) -> Self {
        Self::UnitState {
            index,
            expected,
            found,
        }
    }

    /// Create a new I/O error with context
    pub fn io_error<S: Into<String>>(message: S, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new CLI error
    pub fn cli_error<S: Into<String>>(message: S, source: Option<clap::Error>) -> Self {
        Self::Cli {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config_error<S: Into<String>>(message: S, file_path: Option<PathBuf>) -> Self {
        Self::Config {
            message: message.into(),
            file_path,
        }
    }

    /// Create a new internal error
    pub fn internal_error<S: Into<String>>(message: S, location: Option<&'static str>) -> Self {
        Self::Internal {
            message: message.into(),
            location,
        }
    }

    /// Check if retrying the whole operation could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            RuwcError::Read { .. } => true,
            RuwcError::Io { .. } => true,
            RuwcError::ThreadSpawn { .. } => true,
            RuwcError::Open { .. } => false,
            RuwcError::ThreadJoin { .. } => false,
            RuwcError::InvalidConfiguration { .. } => false,
            RuwcError::UnitState { .. } => false,
            RuwcError::Internal { .. } => false,
            _ => false,
        }
    }

    /// Get error category for reporting
    pub fn category(&self) -> &'static str {
        match self {
            RuwcError::Open { .. } => "open",
            RuwcError::Read { .. } => "read",
            RuwcError::ThreadSpawn { .. } => "threading",
            RuwcError::ThreadJoin { .. } => "threading",
            RuwcError::InvalidConfiguration { .. } => "input",
            RuwcError::UnitState { .. } => "internal",
            RuwcError::Io { .. } => "io",
            RuwcError::Cli { .. } => "cli",
            RuwcError::Config { .. } => "config",
            RuwcError::Internal { .. } => "internal",
        }
    }

    /// Process exit code for this error (sysexits.h where one fits)
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            "cli" => 2,
            "input" => 22,
            "open" => 66,
            "threading" => 71,
            "read" | "io" => 74,
            "config" => 78,
            _ => 1,
        }
    }
}

// Conversion implementations for common error types
impl From<std::io::Error> for RuwcError {
    fn from(err: std::io::Error) -> Self {
        Self::io_error("I/O operation failed", err)
    }
}

impl From<clap::Error> for RuwcError {
    fn from(err: clap::Error) -> Self {
        Self::cli_error("Command line parsing failed", Some(err))
    }
}

impl From<toml::de::Error> for RuwcError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_error(format!("TOML parsing failed: {}", err), None)
    }
}

impl From<serde_json::Error> for RuwcError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal_error(format!("JSON encoding failed: {}", err), Some(file!()))
    }
}
