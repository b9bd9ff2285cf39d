//! Command line argument parsing utilities
//!
//! Value parsers shared by the CLI and the configuration file.

use crate::error::{Result, RuwcError};

/// Parse a byte size such as `4096`, `64K`, `1MiB` or `2GB`
///
/// Every suffix is binary: `K`, `KB` and `KiB` all mean 1024 bytes.
pub fn parse_buffer_size(s: &str) -> Result<usize> {
    let trimmed = s.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);

    if digits.is_empty() {
        return Err(RuwcError::invalid_configuration(
            format!("Invalid buffer size: {}", s),
            Some(s.to_string()),
        ));
    }

    let multiplier: usize = match suffix.trim().to_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1 << 10,
        "m" | "mb" | "mib" => 1 << 20,
        "g" | "gb" | "gib" => 1 << 30,
        other => {
            return Err(RuwcError::invalid_configuration(
                format!("Unknown size suffix '{}' in: {}", other, s),
                Some(s.to_string()),
            ))
        }
    };

    let value: usize = digits.parse().map_err(|_| {
        RuwcError::invalid_configuration(format!("Buffer size out of range: {}", s), Some(s.to_string()))
    })?;
    let bytes = value.checked_mul(multiplier).ok_or_else(|| {
        RuwcError::invalid_configuration(format!("Buffer size out of range: {}", s), Some(s.to_string()))
    })?;

    if bytes == 0 {
        return Err(RuwcError::invalid_configuration(
            "Buffer size must be greater than zero",
            Some(s.to_string()),
        ));
    }

    Ok(bytes)
}

/// Parse a thread count string (0 = one per CPU)
pub fn parse_thread_count(s: &str) -> Result<usize> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(0);
    }

    s.parse().map_err(|_| {
        RuwcError::invalid_configuration(format!("Invalid thread count: {}", s), Some(s.to_string()))
    })
}

/// Validate a file path for CLI usage
pub fn validate_cli_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RuwcError::invalid_configuration(
            "Path cannot be empty",
            Some(path.to_string()),
        ));
    }

    if path.contains('\0') {
        return Err(RuwcError::invalid_configuration(
            "Path contains null bytes",
            Some(path.to_string()),
        ));
    }

    Ok(())
}
