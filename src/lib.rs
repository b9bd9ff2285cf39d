//! ruwc - parallel line counter
//!
//! Counts newline bytes in very large files: one thread reads the input into
//! a fixed pool of buffers while worker threads scan filled buffers in
//! parallel.
//!
//! ```no_run
//! let report = ruwc::count_lines("big.log", 4, 1024 * 1024)?;
//! println!("{}", report.total);
//! # Ok::<(), ruwc::RuwcError>(())
//! ```

pub mod cli;
pub mod error;
pub mod memory;
pub mod threading;
pub mod utils;

// Re-export main types for library usage
pub use error::{Result, RuwcError};

// Re-export counting types
pub use threading::{
    count_lines, count_sequential, CountConfig, CountReport, DelimiterCounter, PipelineStats,
    ShutdownPolicy, Strategy, ThreadResult, ThreadSafeProgress,
};

// Re-export memory types
pub use memory::{BufferPool, PoolStats, UnitHandle, UnitStatus};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
