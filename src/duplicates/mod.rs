//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size bucketing (Phase 1)
//! - Parallel fingerprinting (Phase 2)
//! - Device-aware grouping (Phase 3)
//! - Canonical inode selection per device partition

pub mod canonical;
pub mod finder;
pub mod groups;

pub use canonical::{select_canonical, CanonicalRecord, InodeGroup, PartitionPlan};
pub use finder::{
    default_workers, find_duplicates, hash_bucket, DuplicateFinder, FindOutcome, FinderConfig,
    FinderError, HashOutcome, ScanSummary,
};
pub use groups::{
    bucket_by_size, group_by_device, CandidateIndex, DeviceGroups, DevicePartition,
    DuplicateSet, GroupingStats, IndexEntry, PathsByFingerprint, SizeBuckets, SizeByFingerprint,
};
