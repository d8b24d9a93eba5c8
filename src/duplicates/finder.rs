//! Duplicate finder orchestrating size bucketing, hashing and device grouping.
//!
//! # Overview
//!
//! This module runs the detection pipeline over a list of candidates:
//! 1. **Phase 1 - Size bucketing**: see [`crate::duplicates::groups`]
//! 2. **Phase 2 - Fingerprinting**: hash attributes + full content of every
//!    file in a size bucket on a bounded worker pool
//! 3. **Phase 3 - Device grouping**: split equal fingerprints by device
//!
//! Hashing tasks are independent. Each one sends its result over a channel
//! to the coordinating thread, which merges them by fingerprint as they
//! arrive. A file that cannot be read is recorded as a non-fatal error and
//! drops out of its group; the rest of the batch continues.
//!
//! Equal fingerprints are trusted: files are not compared byte-for-byte
//! before they are linked.
//!
//! # Example
//!
//! ```no_run
//! use fidedu::duplicates::{DuplicateFinder, FinderConfig};
//! use fidedu::scanner::{VisitedDirs, Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], WalkerConfig::default());
//! let mut visited = VisitedDirs::new();
//! let files: Vec<_> = walker.walk(&mut visited).filter_map(Result::ok).collect();
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_workers(4));
//! let outcome = finder.find_duplicates(files).unwrap();
//! println!("{} duplicate sets", outcome.duplicates.set_count());
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use crate::progress::{ProgressCallback, PHASE_HASHING};
use crate::scanner::{FileCandidate, Fingerprint, HashError, Hasher, DEFAULT_BUFFER_SIZE};

use super::groups::{
    bucket_by_size, group_by_device, DuplicateSet, PathsByFingerprint, SizeByFingerprint,
};

/// Number of hashing workers used when none is configured.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Result of hashing one size bucket.
#[derive(Debug, Default)]
pub struct HashOutcome {
    /// Fingerprint → paths, each list in original candidate order
    pub by_fingerprint: PathsByFingerprint,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Bytes of content read for successfully hashed files
    pub bytes_hashed: u64,
    /// Files that could not be hashed (excluded from grouping)
    pub errors: Vec<HashError>,
    /// Whether at least one task was abandoned due to shutdown
    pub interrupted: bool,
}

/// Fingerprint every candidate of one bucket on `pool`.
///
/// One task is spawned per candidate; results flow back over an `mpsc`
/// channel and are merged on the calling thread in completion order. Each
/// fingerprint's path list is then put back into candidate order so the
/// output does not depend on scheduling.
///
/// `progress_offset` is added to the per-file counter passed to `progress`,
/// so several buckets can share one progress bar.
pub fn hash_bucket(
    candidates: &[FileCandidate],
    hasher: &Hasher,
    pool: &rayon::ThreadPool,
    progress: Option<&dyn ProgressCallback>,
    progress_offset: usize,
) -> HashOutcome {
    let mut outcome = HashOutcome::default();
    if candidates.is_empty() {
        return outcome;
    }

    let mut by_index: BTreeMap<Fingerprint, Vec<usize>> = BTreeMap::new();
    let (tx, rx) = mpsc::channel::<(usize, Result<Fingerprint, HashError>)>();

    pool.in_place_scope(|scope| {
        for (idx, candidate) in candidates.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let result = hasher.fingerprint(&candidate.path);
                // The receiver outlives the scope; a send can only fail if it panicked.
                let _ = tx.send((idx, result));
            });
        }
        drop(tx);

        for (received, (idx, result)) in rx.iter().enumerate() {
            let candidate = &candidates[idx];
            if let Some(cb) = progress {
                cb.on_progress(progress_offset + received + 1, &candidate.path.to_string_lossy());
            }
            match result {
                Ok(fingerprint) => {
                    outcome.hashed_files += 1;
                    outcome.bytes_hashed += candidate.size;
                    by_index.entry(fingerprint).or_default().push(idx);
                    if let Some(cb) = progress {
                        cb.on_item_completed(candidate.size);
                    }
                }
                Err(e) if e.is_interrupted() => {
                    outcome.interrupted = true;
                }
                Err(e) => {
                    log::warn!("Skipping unreadable file: {}", e);
                    outcome.errors.push(e);
                }
            }
        }
    });

    for (fingerprint, mut indices) in by_index {
        indices.sort_unstable();
        outcome.by_fingerprint.insert(
            fingerprint,
            indices
                .into_iter()
                .map(|i| candidates[i].path.clone())
                .collect(),
        );
    }

    outcome
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hashing worker threads (at least 1).
    pub workers: usize,
    /// Read chunk size for content hashing.
    pub buffer_size: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("workers", &self.workers)
            .field("buffer_size", &self.buffer_size)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the hashing worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the read chunk size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
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

/// Summary statistics from duplicate detection.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Total number of candidates considered
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Number of candidates eliminated by size bucketing
    pub eliminated_by_size: usize,
    /// Number of files successfully fingerprinted
    pub hashed_files: usize,
    /// Bytes of content read while fingerprinting
    pub bytes_hashed: u64,
    /// Files that could not be fingerprinted
    pub hash_errors: Vec<HashError>,
    /// Duration of detection
    pub duration: Duration,
    /// Whether detection was interrupted
    pub interrupted: bool,
}

impl ScanSummary {
    /// Number of per-file warnings recorded.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.hash_errors.len()
    }
}

/// Everything detection produces.
#[derive(Debug, Default)]
pub struct FindOutcome {
    /// Actionable duplicate partitions
    pub duplicates: DuplicateSet,
    /// File size for each fingerprint in `duplicates`
    pub sizes: SizeByFingerprint,
    /// Detection statistics
    pub summary: ScanSummary,
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The hashing worker pool could not be created.
    #[error("Failed to start hashing workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Duplicate finder running size bucketing, fingerprinting and grouping.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new().with_buffer_size(config.buffer_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find duplicate partitions among `candidates`.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if shutdown was requested before
    /// hashing finished, or [`FinderError::ThreadPool`] if the worker pool
    /// cannot be started. Unreadable files are not errors; they are listed
    /// in [`ScanSummary::hash_errors`].
    pub fn find_duplicates(
        &self,
        candidates: impl IntoIterator<Item = FileCandidate>,
    ) -> Result<FindOutcome, FinderError> {
        let start = Instant::now();
        let (buckets, index, stats) = bucket_by_size(candidates);

        let mut summary = ScanSummary {
            total_files: stats.total_files,
            total_size: stats.total_size,
            eliminated_by_size: stats.eliminated_unique,
            ..Default::default()
        };

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if buckets.is_empty() {
            summary.duration = start.elapsed();
            return Ok(FindOutcome {
                summary,
                ..Default::default()
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .thread_name(|i| format!("fidedu-hash-{i}"))
            .build()?;

        let progress = self.config.progress_callback.as_deref();
        if let Some(cb) = progress {
            cb.on_phase_start(PHASE_HASHING, stats.potential_duplicates);
        }
        log::info!(
            "Phase 2: Fingerprinting {} files with {} workers",
            stats.potential_duplicates,
            self.config.workers
        );

        let mut by_fingerprint = PathsByFingerprint::new();
        let mut sizes = SizeByFingerprint::new();
        let mut done = 0usize;

        for (size, bucket) in &buckets {
            let outcome = hash_bucket(bucket, &self.hasher, &pool, progress, done);
            done += bucket.len();

            summary.hashed_files += outcome.hashed_files;
            summary.bytes_hashed += outcome.bytes_hashed;
            summary.hash_errors.extend(outcome.errors);

            for (fingerprint, paths) in outcome.by_fingerprint {
                sizes.insert(fingerprint, *size);
                by_fingerprint.entry(fingerprint).or_default().extend(paths);
            }

            if outcome.interrupted || self.config.is_shutdown_requested() {
                summary.interrupted = true;
                break;
            }
        }

        if let Some(cb) = progress {
            cb.on_phase_end(PHASE_HASHING);
        }

        if summary.interrupted {
            log::info!("Phase 2: Shutdown requested after {} files", done);
            return Err(FinderError::Interrupted);
        }

        let duplicates = DuplicateSet::from_groups(group_by_device(by_fingerprint, &index));
        let kept: HashSet<Fingerprint> = duplicates.partitions().map(|p| p.fingerprint).collect();
        sizes.retain(|fp, _| kept.contains(fp));
        summary.duration = start.elapsed();

        log::info!(
            "Phase 3 complete: {} duplicate set(s), {} files involved, {} unreadable",
            duplicates.set_count(),
            duplicates.file_count(),
            summary.hash_errors.len()
        );

        Ok(FindOutcome {
            duplicates,
            sizes,
            summary,
        })
    }
}

/// Detect duplicates among `candidates` using `worker_count` hashing workers.
///
/// # Errors
///
/// See [`DuplicateFinder::find_duplicates`].
pub fn find_duplicates(
    candidates: impl IntoIterator<Item = FileCandidate>,
    worker_count: usize,
) -> Result<(DuplicateSet, SizeByFingerprint), FinderError> {
    let finder = DuplicateFinder::new(FinderConfig::default().with_workers(worker_count));
    let outcome = finder.find_duplicates(candidates)?;
    Ok((outcome.duplicates, outcome.sizes))
}
