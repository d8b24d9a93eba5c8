//! File actions module.
//!
//! This module provides functionality for:
//! - In-place replacement of duplicates by hard links
//! - Planning and applying every duplicate partition, with dry-run support
//!
//! # Relinking
//!
//! The link module replaces one path at a time:
//! - Remove the duplicate path
//! - Create a hard link to the canonical target at the same path
//! - Per-file failures are recorded and the batch continues
//!
//! ```no_run
//! use fidedu::actions::{apply, ApplyConfig};
//! use fidedu::duplicates::find_duplicates;
//!
//! let (dupes, sizes) = find_duplicates(Vec::new(), 4).unwrap();
//! let report = apply(&dupes, &sizes, &ApplyConfig::default());
//! println!("{} relinks planned", report.relinks_planned);
//! ```

pub mod apply;
pub mod link;

// Re-export commonly used types
pub use apply::{apply, ApplyConfig, DedupReport, LinkFailure, PartitionReport};
pub use link::{apply_plan, relink, BatchLinkResult, LinkConfig, LinkError};
