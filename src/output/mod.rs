//! Output formatters for deduplication runs.
//!
//! This module provides two output formats:
//! - Plain text for terminals
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use fidedu::actions::{apply, ApplyConfig};
//! use fidedu::duplicates::find_duplicates;
//! use fidedu::output::TextReport;
//!
//! let (dupes, sizes) = find_duplicates(Vec::new(), 4).unwrap();
//! let report = apply(&dupes, &sizes, &ApplyConfig::default());
//! print!("{}", TextReport::new(&report).render());
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonOutput, JsonOutputError, JsonSummary};
pub use text::TextReport;
