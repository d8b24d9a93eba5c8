//! Size bucketing and device-aware duplicate grouping.
//!
//! # Overview
//!
//! ## Size bucketing (Phase 1)
//!
//! Files with different sizes cannot be duplicates, so candidates are first
//! bucketed by exact size and singleton sizes are dropped without any I/O.
//! Alongside the buckets an index from path to `(size, device, inode)` is
//! kept for every candidate seen.
//!
//! ## Device grouping (Phase 3)
//!
//! After fingerprinting, paths sharing a fingerprint are split by device.
//! Hard links cannot span devices, so a partition is only actionable when it
//! holds at least two paths on the same device.
//!
//! # Example
//!
//! ```
//! use fidedu::scanner::FileCandidate;
//! use fidedu::duplicates::bucket_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileCandidate::new(PathBuf::from("/file1.txt"), 1024, 1, 10),
//!     FileCandidate::new(PathBuf::from("/file2.txt"), 1024, 1, 11),
//!     FileCandidate::new(PathBuf::from("/file3.txt"), 2048, 1, 12),
//! ];
//!
//! let (buckets, index, stats) = bucket_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);  // Two 1024-byte files
//! assert_eq!(buckets.len(), 1);
//! assert_eq!(index.len(), 3);                 // Every file is indexed
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::scanner::{FileCandidate, Fingerprint};

/// Sizes occurring at least twice, each with its candidates in input order.
pub type SizeBuckets = BTreeMap<u64, Vec<FileCandidate>>;

/// Fingerprint to paths, accumulated across all size buckets.
pub type PathsByFingerprint = BTreeMap<Fingerprint, Vec<PathBuf>>;

/// Size of the files behind each fingerprint in a [`DuplicateSet`].
pub type SizeByFingerprint = BTreeMap<Fingerprint, u64>;

/// Stat information recorded for one candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// File size in bytes
    pub size: u64,
    /// Device the file lives on
    pub device_id: u64,
    /// Inode the path refers to
    pub inode_id: u64,
}

/// Path → `(size, device, inode)` for every candidate seen, bucketed or not.
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    entries: HashMap<PathBuf, IndexEntry>,
}

impl CandidateIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate. A later record for the same path replaces the earlier one.
    pub fn insert(&mut self, candidate: &FileCandidate) {
        self.entries.insert(
            candidate.path.clone(),
            IndexEntry {
                size: candidate.size,
                device_id: candidate.device_id,
                inode_id: candidate.inode_id,
            },
        );
    }

    /// Look up a path.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Rebuild the full candidate for a path.
    #[must_use]
    pub fn candidate(&self, path: &Path) -> Option<FileCandidate> {
        self.get(path).map(|e| FileCandidate {
            path: path.to_path_buf(),
            size: e.size,
            device_id: e.device_id,
            inode_id: e.inode_id,
        })
    }

    /// Number of indexed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Statistics from the size bucketing phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in buckets of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton sizes)
    pub eliminated_unique: usize,
    /// Number of size buckets with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size bucketing.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Bucket candidates by size (Phase 1 of duplicate detection).
///
/// Returns the buckets with two or more members, an index over every
/// candidate, and statistics. No file I/O is performed.
///
/// ```
/// use fidedu::scanner::FileCandidate;
/// use fidedu::duplicates::bucket_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileCandidate::new(PathBuf::from("/a.txt"), 100, 1, 1),
///     FileCandidate::new(PathBuf::from("/b.txt"), 100, 1, 2),
///     FileCandidate::new(PathBuf::from("/c.txt"), 200, 1, 3),
/// ];
///
/// let (buckets, _index, stats) = bucket_by_size(files);
/// assert_eq!(buckets[&100].len(), 2);
/// assert_eq!(stats.eliminated_unique, 1);  // The 200-byte file
/// ```
#[must_use]
pub fn bucket_by_size(
    candidates: impl IntoIterator<Item = FileCandidate>,
) -> (SizeBuckets, CandidateIndex, GroupingStats) {
    let mut all: BTreeMap<u64, Vec<FileCandidate>> = BTreeMap::new();
    let mut index = CandidateIndex::new();
    let mut stats = GroupingStats::default();

    for candidate in candidates {
        stats.total_files += 1;
        stats.total_size += candidate.size;
        index.insert(&candidate);
        all.entry(candidate.size).or_default().push(candidate);
    }

    stats.unique_sizes = all.len();

    let buckets: SizeBuckets = all
        .into_iter()
        .filter(|(size, files)| {
            if files.len() < 2 {
                stats.eliminated_unique += files.len();
                log::trace!("Eliminated unique size {}: {}", size, files[0].path.display());
                false
            } else {
                stats.potential_duplicates += files.len();
                stats.duplicate_groups += 1;
                log::debug!("Size bucket {} bytes: {} candidates", size, files.len());
                true
            }
        })
        .collect();

    log::info!(
        "Phase 1 complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (buckets, index, stats)
}

/// Paths sharing one fingerprint, split by device; only partitions of 2+ kept.
pub type DeviceGroups = BTreeMap<u64, Vec<FileCandidate>>;

/// Split each fingerprint's paths by device (Phase 3 of duplicate detection).
///
/// Fingerprints with fewer than two paths are dropped, as are device
/// partitions with fewer than two members. Paths missing from `index` are
/// ignored. Member order within a partition follows the order in
/// `by_fingerprint`.
#[must_use]
pub fn group_by_device(
    by_fingerprint: PathsByFingerprint,
    index: &CandidateIndex,
) -> Vec<(Fingerprint, DeviceGroups)> {
    let mut out = Vec::new();

    for (fingerprint, paths) in by_fingerprint {
        if paths.len() < 2 {
            continue;
        }

        let mut by_device: DeviceGroups = BTreeMap::new();
        for path in &paths {
            match index.candidate(path) {
                Some(c) => by_device.entry(c.device_id).or_default().push(c),
                None => log::debug!("Path missing from index: {}", path.display()),
            }
        }

        let before = by_device.len();
        by_device.retain(|_, files| files.len() >= 2);
        if by_device.len() < before {
            log::debug!(
                "Fingerprint {}: {} device partition(s) dropped as unlinkable",
                fingerprint.short_hex(),
                before - by_device.len()
            );
        }

        if !by_device.is_empty() {
            out.push((fingerprint, by_device));
        }
    }

    out
}

/// One actionable unit: identical files on a single device.
#[derive(Debug, Clone, Copy)]
pub struct DevicePartition<'a> {
    /// Shared fingerprint
    pub fingerprint: Fingerprint,
    /// Shared device
    pub device_id: u64,
    /// Shared file size
    pub size: u64,
    /// Members in first-encountered order
    pub files: &'a [FileCandidate],
}

impl DevicePartition<'_> {
    /// Number of paths in the partition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the partition has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Fingerprint → device → identical files.
///
/// Every retained device partition has at least two members, and all
/// members of a partition share fingerprint, size and device.
#[derive(Debug, Clone, Default)]
pub struct DuplicateSet {
    entries: BTreeMap<Fingerprint, DeviceGroups>,
}

impl DuplicateSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the output of [`group_by_device`].
    #[must_use]
    pub fn from_groups(groups: Vec<(Fingerprint, DeviceGroups)>) -> Self {
        let mut set = Self::new();
        for (fingerprint, devices) in groups {
            for (device_id, files) in devices {
                set.insert(fingerprint, device_id, files);
            }
        }
        set
    }

    /// Add a device partition. Partitions with fewer than two files are ignored.
    pub fn insert(&mut self, fingerprint: Fingerprint, device_id: u64, files: Vec<FileCandidate>) {
        if files.len() < 2 {
            return;
        }
        debug_assert!(files.iter().all(|f| f.device_id == device_id));
        self.entries
            .entry(fingerprint)
            .or_default()
            .insert(device_id, files);
    }

    /// Iterate partitions ordered by fingerprint, then device id.
    pub fn partitions(&self) -> impl Iterator<Item = DevicePartition<'_>> {
        self.entries.iter().flat_map(|(fingerprint, devices)| {
            devices.iter().map(move |(device_id, files)| DevicePartition {
                fingerprint: *fingerprint,
                device_id: *device_id,
                size: files.first().map_or(0, |f| f.size),
                files,
            })
        })
    }

    /// Number of device partitions (duplicate sets).
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Number of distinct fingerprints.
    #[must_use]
    pub fn fingerprint_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of paths across all partitions.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.partitions().map(|p| p.len()).sum()
    }

    /// Whether no partition was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
