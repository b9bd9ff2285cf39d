//! Integration tests for ruwc
//!
//! Library-level counting scenarios, fault injection against the reader,
//! property tests against the sequential count, and the CLI binary.

mod cli_operations;
mod counting_scenarios;
mod fault_injection;
mod properties;

use std::io::Write;
use tempfile::NamedTempFile;

/// Write `content` to a fresh temporary file
pub fn temp_file_with(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// Naive newline count used as the expected value
pub fn naive_count(data: &[u8]) -> u64 {
    data.iter().filter(|b| **b == b'\n').count() as u64
}
