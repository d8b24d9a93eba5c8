//! In-place hardlink replacement.
//!
//! # Overview
//!
//! A relink removes a duplicate path and recreates it as a hard link to the
//! canonical target of its partition:
//! - Remove the existing directory entry
//! - Create a hard link at the same path pointing to the target
//!
//! # Safety
//!
//! The two steps are not atomic. Between them the path does not exist, and
//! if the link step fails after the removal succeeded, the content that was
//! reachable through that path is gone. That case is reported as
//! [`LinkError::LinkFailed`] and logged at error level; nothing is rolled
//! back. The canonical target is checked before a partition is touched, so
//! a vanished target never causes any removal.
//!
//! # Example
//!
//! ```no_run
//! use fidedu::actions::link::relink;
//! use std::path::Path;
//!
//! match relink(Path::new("/data/copy.bin"), Path::new("/data/original.bin")) {
//!     Ok(()) => println!("linked"),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::duplicates::PartitionPlan;

/// Error type for relink operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The path disappeared before it could be removed.
    #[error("file vanished before relink: {0}")]
    Vanished(PathBuf),

    /// Permission denied while removing the path; the path is unchanged.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Removing the path failed; the path is unchanged.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The path was removed but the hard link could not be created.
    #[error("DATA LOSS: removed {path} but could not link it to {target}: {source}")]
    LinkFailed {
        /// Path that no longer exists
        path: PathBuf,
        /// Canonical target the link should have pointed at
        target: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The canonical target is gone; the partition was left untouched.
    #[error("canonical target missing: {0}")]
    TargetMissing(PathBuf),
}

impl LinkError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Vanished(p)
            | Self::PermissionDenied(p)
            | Self::TargetMissing(p)
            | Self::Io { path: p, .. }
            | Self::LinkFailed { path: p, .. } => p,
        }
    }

    /// Whether content was lost because of this failure.
    #[must_use]
    pub fn is_data_loss(&self) -> bool {
        matches!(self, Self::LinkFailed { .. })
    }
}

/// Replace `path` with a hard link to `target`.
///
/// # Errors
///
/// - [`LinkError::Vanished`] if `path` no longer exists
/// - [`LinkError::PermissionDenied`] / [`LinkError::Io`] if removal failed
/// - [`LinkError::LinkFailed`] if removal succeeded but linking did not
pub fn relink(path: &Path, target: &Path) -> Result<(), LinkError> {
    fs::remove_file(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LinkError::Vanished(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => LinkError::PermissionDenied(path.to_path_buf()),
        _ => LinkError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    fs::hard_link(target, path).map_err(|e| {
        log::error!(
            "Data loss: {} was removed but linking to {} failed: {}",
            path.display(),
            target.display(),
            e
        );
        LinkError::LinkFailed {
            path: path.to_path_buf(),
            target: target.to_path_buf(),
            source: e,
        }
    })?;

    log::debug!("Relinked {} -> {}", path.display(), target.display());
    Ok(())
}

/// Configuration for applying a partition plan.
#[derive(Debug, Clone, Default)]
pub struct LinkConfig {
    /// Stop before the next relink once this flag is set.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl LinkConfig {
    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Results of relinking one partition.
#[derive(Debug, Default)]
pub struct BatchLinkResult {
    /// Paths now linked to the canonical target.
    pub relinked: Vec<PathBuf>,
    /// Paths that vanished before they were reached.
    pub vanished: Vec<PathBuf>,
    /// Failed relinks whose path is still intact (or the missing target).
    pub failures: Vec<(PathBuf, String)>,
    /// Paths removed without the replacement link being created.
    pub data_loss: Vec<PathBuf>,
    /// Whether the partition was cut short by shutdown.
    pub interrupted: bool,
}

impl BatchLinkResult {
    /// Number of successful relinks.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.relinked.len()
    }

    /// Number of failed relinks, data loss included.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len() + self.data_loss.len()
    }

    /// Check if every planned relink succeeded or vanished.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && self.data_loss.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!("Relinked {} file(s)", self.success_count())
        } else {
            format!(
                "Relinked {} file(s), {} failed",
                self.success_count(),
                self.failure_count()
            )
        }
    }

    fn record(&mut self, path: &Path, error: LinkError) {
        match error {
            LinkError::Vanished(p) => {
                log::debug!("Skipping vanished file: {}", p.display());
                self.vanished.push(p);
            }
            LinkError::LinkFailed { path, .. } => self.data_loss.push(path),
            other => {
                log::warn!("Relink failed for {}: {}", path.display(), other);
                self.failures.push((path.to_path_buf(), other.to_string()));
            }
        }
    }
}

/// Relink every path outside the canonical inode of `plan`.
///
/// Never aborts on a single failure. A plan without a canonical record is
/// a no-op.
#[must_use]
pub fn apply_plan(plan: &PartitionPlan, config: &LinkConfig) -> BatchLinkResult {
    let mut result = BatchLinkResult::default();
    let Some(canonical) = plan.canonical.as_ref() else {
        return result;
    };

    if let Err(e) = fs::symlink_metadata(&canonical.target) {
        let error = if e.kind() == io::ErrorKind::NotFound {
            LinkError::TargetMissing(canonical.target.clone())
        } else {
            LinkError::Io {
                path: canonical.target.clone(),
                source: e,
            }
        };
        log::warn!(
            "Skipping partition {}: {}",
            plan.fingerprint.short_hex(),
            error
        );
        result
            .failures
            .push((canonical.target.clone(), error.to_string()));
        return result;
    }

    for file in plan.relink_targets() {
        if config.is_shutdown_requested() {
            log::debug!("Relinking: shutdown requested, stopping");
            result.interrupted = true;
            break;
        }

        debug_assert_eq!(file.device_id, plan.device_id);
        match relink(&file.path, &canonical.target) {
            Ok(()) => result.relinked.push(file.path.clone()),
            Err(e) => result.record(&file.path, e),
        }
    }

    log::debug!(
        "Partition {}: {}",
        plan.fingerprint.short_hex(),
        result.summary()
    );
    result
}
