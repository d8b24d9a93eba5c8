//! JSON output formatter for deduplication runs.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "report": {
//!     "duplicate_set_count": 2,
//!     "files_involved": 5,
//!     "relinks_planned": 1,
//!     "bytes_reclaimable": 1024,
//!     "relinks_performed": 0,
//!     "vanished": [],
//!     "failures": [],
//!     "data_loss": [],
//!     "interrupted": false,
//!     "dry_run": true
//!   },
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "eliminated_by_size": 90,
//!     "hashed_files": 10,
//!     "bytes_hashed": 10240,
//!     "scan_errors": 0,
//!     "hash_errors": 0,
//!     "duration_ms": 12,
//!     "interrupted": false,
//!     "exit_code": 0,
//!     "exit_code_name": "FD000"
//!   },
//!   "warnings": []
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::actions::DedupReport;
use crate::duplicates::ScanSummary;
use crate::error::ExitCode;

/// Detection statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of regular files discovered
    pub total_files: usize,
    /// Total size of all discovered files in bytes
    pub total_size: u64,
    /// Files ruled out by having a unique size
    pub eliminated_by_size: usize,
    /// Files successfully fingerprinted
    pub hashed_files: usize,
    /// Bytes read while fingerprinting
    pub bytes_hashed: u64,
    /// Entries skipped while walking
    pub scan_errors: usize,
    /// Files skipped while fingerprinting
    pub hash_errors: usize,
    /// Duration of detection in milliseconds
    pub duration_ms: u64,
    /// Whether the run was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "FD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Build from a detection summary, the walk's error count and the exit code.
    #[must_use]
    pub fn from_scan_summary(
        summary: &ScanSummary,
        scan_errors: usize,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            eliminated_by_size: summary.eliminated_by_size,
            hashed_files: summary.hashed_files,
            bytes_hashed: summary.bytes_hashed,
            scan_errors,
            hash_errors: summary.hash_errors.len(),
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Planned and applied deduplication
    pub report: DedupReport,
    /// Detection statistics
    pub summary: JsonSummary,
    /// Per-file warnings collected while walking and hashing
    pub warnings: Vec<String>,
}

impl JsonOutput {
    /// Create JSON output from a report and its detection summary.
    ///
    /// # Example
    ///
    /// ```
    /// use fidedu::actions::DedupReport;
    /// use fidedu::duplicates::ScanSummary;
    /// use fidedu::error::ExitCode;
    /// use fidedu::output::JsonOutput;
    ///
    /// let output = JsonOutput::new(
    ///     &DedupReport::default(),
    ///     &ScanSummary::default(),
    ///     Vec::new(),
    ///     ExitCode::NoDuplicates,
    /// );
    /// assert_eq!(output.summary.exit_code, 2);
    /// ```
    #[must_use]
    pub fn new(
        report: &DedupReport,
        summary: &ScanSummary,
        scan_warnings: Vec<String>,
        exit_code: ExitCode,
    ) -> Self {
        let scan_errors = scan_warnings.len();
        let mut warnings = scan_warnings;
        warnings.extend(summary.hash_errors.iter().map(ToString::to_string));
        Self {
            report: report.clone(),
            summary: JsonSummary::from_scan_summary(summary, scan_errors, exit_code),
            warnings,
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
