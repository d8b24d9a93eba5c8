//! Apply entry point: plan every partition, then relink unless dry-run.
//!
//! Planned statistics are computed from the canonical selection of every
//! partition before anything is touched, so a dry run reports exactly what
//! a real run would attempt.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::duplicates::{
    select_canonical, DevicePartition, DuplicateSet, PartitionPlan, SizeByFingerprint,
};
use crate::progress::{ProgressCallback, PHASE_LINKING};

use super::link::{apply_plan, LinkConfig};

/// Options for [`apply`].
#[derive(Clone)]
pub struct ApplyConfig {
    /// Plan only; never touch the filesystem.
    pub dry_run: bool,
    /// Include per-partition membership in the report.
    pub verbose: bool,
    /// Stop before the next relink once set.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for the linking phase.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            verbose: false,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl std::fmt::Debug for ApplyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyConfig")
            .field("dry_run", &self.dry_run)
            .field("verbose", &self.verbose)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ApplyConfig {
    /// Set dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set verbose reporting.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Membership of one partition, for verbose output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PartitionReport {
    /// First 16 hex characters of the fingerprint
    pub fingerprint: String,
    /// Device the partition lives on
    pub device_id: u64,
    /// Size of each file
    pub size: u64,
    /// Number of distinct inodes before relinking
    pub unique_inodes: usize,
    /// Path every other member is linked to, if any work is needed
    pub canonical: Option<PathBuf>,
    /// All member paths
    pub paths: Vec<PathBuf>,
}

impl From<&PartitionPlan> for PartitionReport {
    fn from(plan: &PartitionPlan) -> Self {
        Self {
            fingerprint: plan.fingerprint.short_hex(),
            device_id: plan.device_id,
            size: plan.size,
            unique_inodes: plan.unique_inode_count,
            canonical: plan.canonical.as_ref().map(|c| c.target.clone()),
            paths: plan.all_paths().cloned().collect(),
        }
    }
}

/// A relink that failed without losing data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LinkFailure {
    /// Affected path
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// Outcome of [`apply`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupReport {
    /// Number of device partitions found
    pub duplicate_set_count: usize,
    /// Paths across all partitions
    pub files_involved: usize,
    /// Relinks the plan calls for
    pub relinks_planned: usize,
    /// Bytes freed once every partition converges on one inode
    pub bytes_reclaimable: u64,
    /// Relinks actually performed (0 in dry-run)
    pub relinks_performed: usize,
    /// Paths that vanished before they were relinked
    pub vanished: Vec<PathBuf>,
    /// Relinks that failed with the path left intact
    pub failures: Vec<LinkFailure>,
    /// Paths removed without the replacement link
    pub data_loss: Vec<PathBuf>,
    /// Whether relinking stopped early on shutdown
    pub interrupted: bool,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Per-partition membership (verbose only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<PartitionReport>,
}

impl DedupReport {
    /// Whether no duplicate partition was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.duplicate_set_count == 0
    }

    /// Whether any relink failed or lost data.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.failures.is_empty() || !self.data_loss.is_empty()
    }
}

/// Plan every partition of `duplicates` and, unless `config.dry_run`, relink.
///
/// `sizes` supplies the file size of each fingerprint; a fingerprint
/// missing from it falls back to the size recorded on its members.
#[must_use]
pub fn apply(
    duplicates: &DuplicateSet,
    sizes: &SizeByFingerprint,
    config: &ApplyConfig,
) -> DedupReport {
    let plans: Vec<PartitionPlan> = duplicates
        .partitions()
        .map(|p| {
            let size = sizes.get(&p.fingerprint).copied().unwrap_or(p.size);
            select_canonical(&DevicePartition { size, ..p })
        })
        .collect();

    let mut report = DedupReport {
        duplicate_set_count: plans.len(),
        files_involved: plans.iter().map(PartitionPlan::total_paths).sum(),
        relinks_planned: plans.iter().map(|p| p.relinks_required).sum(),
        bytes_reclaimable: plans.iter().map(|p| p.savings).sum(),
        dry_run: config.dry_run,
        ..Default::default()
    };

    if config.verbose {
        report.partitions = plans.iter().map(PartitionReport::from).collect();
    }

    if config.dry_run {
        log::info!(
            "Dry run: {} relink(s) planned across {} set(s)",
            report.relinks_planned,
            report.duplicate_set_count
        );
        return report;
    }

    let link_config = LinkConfig {
        shutdown_flag: config.shutdown_flag.clone(),
    };
    let progress = config.progress_callback.as_deref();
    if let Some(cb) = progress {
        cb.on_phase_start(PHASE_LINKING, report.relinks_planned);
    }

    let mut done = 0usize;
    for plan in plans.iter().filter(|p| !p.is_resolved()) {
        if config.is_shutdown_requested() {
            report.interrupted = true;
            break;
        }

        let result = apply_plan(plan, &link_config);
        done += plan.relinks_required;
        if let Some(cb) = progress {
            let label = plan
                .canonical
                .as_ref()
                .map(|c| c.target.to_string_lossy().into_owned())
                .unwrap_or_default();
            cb.on_progress(done, &label);
            cb.on_item_completed(plan.size * result.relinked.len() as u64);
        }

        report.relinks_performed += result.relinked.len();
        report.vanished.extend(result.vanished);
        report.data_loss.extend(result.data_loss);
        report.failures.extend(
            result
                .failures
                .into_iter()
                .map(|(path, error)| LinkFailure { path, error }),
        );
        if result.interrupted {
            report.interrupted = true;
            break;
        }
    }

    if let Some(cb) = progress {
        cb.on_phase_end(PHASE_LINKING);
    }

    log::info!(
        "Relinked {} of {} planned file(s); {} failed, {} vanished",
        report.relinks_performed,
        report.relinks_planned,
        report.failures.len() + report.data_loss.len(),
        report.vanished.len()
    );
    if !report.data_loss.is_empty() {
        log::error!(
            "{} path(s) were removed but could not be relinked",
            report.data_loss.len()
        );
    }

    report
}
