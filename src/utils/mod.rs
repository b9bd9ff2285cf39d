//! Utility modules for ruwc
//!
//! Formatting helpers shared by the CLI and the progress reporting, plus the
//! logging and configuration layers.

pub mod config;
pub mod logging;

pub use config::*;
pub use logging::*;

use std::time::Duration;

/// Version information for the application
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        authors: env!("CARGO_PKG_AUTHORS").to_string(),
        description: env!("CARGO_PKG_DESCRIPTION").to_string(),
        homepage: env!("CARGO_PKG_HOMEPAGE").to_string(),
        repository: env!("CARGO_PKG_REPOSITORY").to_string(),
        license: env!("CARGO_PKG_LICENSE").to_string(),
        target: format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS),
        cpus: num_cpus::get(),
    }
}

/// Complete version information structure
#[derive(Debug, Clone, PartialEq)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
    pub authors: String,
    pub description: String,
    pub homepage: String,
    pub repository: String,
    pub license: String,
    pub target: String,
    /// Logical processors, i.e. the default worker count
    pub cpus: usize,
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} {}", self.name, self.version)?;
        writeln!(f, "Authors: {}", self.authors)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "Homepage: {}", self.homepage)?;
        writeln!(f, "Repository: {}", self.repository)?;
        writeln!(f, "License: {}", self.license)?;
        writeln!(f, "Target: {}", self.target)?;
        write!(f, "Default workers: {}", self.cpus)
    }
}

/// Format a byte count in human-readable binary units
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else if size >= 10.0 {
        format!("{:.0} {}", size, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format a count with `,` thousands separators
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_seconds == 0 {
        if millis == 0 {
            return format!("{}μs", duration.subsec_micros());
        } else {
            return format!("{}ms", millis);
        }
    }

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, millis)
    }
}

/// Throughput in MiB/s, 0 when no time has elapsed
pub fn throughput_mib_per_sec(bytes: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }

    let seconds = duration.as_secs_f64();
    let mebibytes = bytes as f64 / (1024.0 * 1024.0);
    mebibytes / seconds
}
