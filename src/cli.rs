//! Command-line interface definitions for fidedu.
//!
//! The CLI takes one or more folders and either reports what relinking would
//! save (the default) or performs it with `--compress`.
//!
//! # Example
//!
//! ```bash
//! # Dry run: report duplicate sets and estimated savings
//! fidedu ~/Photos ~/Backup/Photos
//!
//! # Replace duplicates by hard links, with per-set details
//! fidedu -c -v ~/Photos
//!
//! # JSON output for scripting
//! fidedu ~/Photos --output json --min-size 1KiB
//! ```

use bytesize::ByteSize;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// In-place hardlink deduplication.
///
/// fidedu finds files with identical content and attributes (mode, owner,
/// group, size, mtime) and, with --compress, replaces every duplicate by a
/// hard link to a single canonical copy on the same device.
#[derive(Debug, Parser)]
#[command(name = "fidedu")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Folders to scan (recursively)
    #[arg(value_name = "FOLDER", required = true)]
    pub folders: Vec<PathBuf>,

    /// Actually replace duplicates by hard links (default is a dry run)
    #[arg(short, long)]
    pub compress: bool,

    /// Increase verbosity level (-v lists duplicate sets and debug logs, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors and the report
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Number of hashing worker threads (default: available parallelism)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: Option<u64>,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Gitignore-style patterns to exclude (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Path to a TOML configuration file
    ///
    /// If not specified, a default platform-specific path is used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format for the report
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// Worker count requested on the command line, if any.
    #[must_use]
    pub fn worker_count(&self) -> Option<usize> {
        self.workers
            .map(|w| usize::try_from(w).unwrap_or(usize::MAX))
    }
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a `--min-size`/`--max-size` value into bytes.
///
/// Accepts anything [`ByteSize`] parses: decimal (`K`, `MB`) and binary
/// (`KiB`, `Mi`) suffixes, case-insensitive. A bare number is bytes.
///
/// # Examples
///
/// ```
/// use fidedu::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, is not a non-negative number,
/// or carries an unknown suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    s.parse::<ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{s}': {e}"))
}
