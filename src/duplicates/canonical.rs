//! Canonical inode selection within a device partition.
//!
//! Paths in a partition may already share inodes. The inode with the most
//! paths is kept, so only the paths outside it have to be relinked. Ties go
//! to the inode encountered first.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::scanner::{FileCandidate, Fingerprint};

use super::groups::DevicePartition;

/// Paths in a partition that already share one inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeGroup {
    /// Shared inode id
    pub inode_id: u64,
    /// Members in first-encountered order
    pub files: Vec<FileCandidate>,
}

impl InodeGroup {
    /// Number of paths in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// The inode kept for a partition and the path new links point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    /// Inode every path converges on
    pub inode_id: u64,
    /// First path of the canonical inode group
    pub target: PathBuf,
}

/// Resolution plan for one device partition.
#[derive(Debug, Clone)]
pub struct PartitionPlan {
    /// Shared fingerprint
    pub fingerprint: Fingerprint,
    /// Shared device
    pub device_id: u64,
    /// Shared file size
    pub size: u64,
    /// Paths grouped by inode, in first-encountered order
    pub inode_groups: Vec<InodeGroup>,
    /// `None` when the partition is already a single inode
    pub canonical: Option<CanonicalRecord>,
    /// Number of distinct inodes
    pub unique_inode_count: usize,
    /// Bytes reclaimed once every path shares one inode
    pub savings: u64,
    /// Paths outside the canonical inode
    pub relinks_required: usize,
}

impl PartitionPlan {
    /// Total number of paths in the partition.
    #[must_use]
    pub fn total_paths(&self) -> usize {
        self.inode_groups.iter().map(InodeGroup::len).sum()
    }

    /// Whether nothing needs to change.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.canonical.is_none()
    }

    /// Paths that must be replaced by a link to the canonical target.
    pub fn relink_targets(&self) -> impl Iterator<Item = &FileCandidate> {
        let keep = self.canonical.as_ref().map(|c| c.inode_id);
        self.inode_groups
            .iter()
            .filter(move |g| keep.is_some_and(|k| g.inode_id != k))
            .flat_map(|g| g.files.iter())
    }

    /// Every member path, grouped by inode.
    pub fn all_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.inode_groups.iter().flat_map(|g| g.files.iter().map(|f| &f.path))
    }
}

/// Group a partition by inode and pick the largest group as canonical.
///
/// ```
/// use fidedu::duplicates::{select_canonical, DevicePartition};
/// use fidedu::scanner::{FileCandidate, Fingerprint};
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileCandidate::new(PathBuf::from("/a"), 10, 1, 100),
///     FileCandidate::new(PathBuf::from("/b"), 10, 1, 100),
///     FileCandidate::new(PathBuf::from("/c"), 10, 1, 101),
/// ];
/// let partition = DevicePartition {
///     fingerprint: Fingerprint([0; 32]),
///     device_id: 1,
///     size: 10,
///     files: &files,
/// };
///
/// let plan = select_canonical(&partition);
/// assert_eq!(plan.canonical.unwrap().inode_id, 100);
/// assert_eq!(plan.relinks_required, 1);
/// assert_eq!(plan.savings, 10);
/// ```
#[must_use]
pub fn select_canonical(partition: &DevicePartition<'_>) -> PartitionPlan {
    // Groups stay in first-encountered order; the map only locates them.
    let mut inode_groups: Vec<InodeGroup> = Vec::new();
    let mut slots: HashMap<u64, usize> = HashMap::with_capacity(partition.files.len());
    for file in partition.files {
        match slots.get(&file.inode_id) {
            Some(&slot) => inode_groups[slot].files.push(file.clone()),
            None => {
                slots.insert(file.inode_id, inode_groups.len());
                inode_groups.push(InodeGroup {
                    inode_id: file.inode_id,
                    files: vec![file.clone()],
                });
            }
        }
    }

    let unique_inode_count = inode_groups.len();
    let total: usize = partition.files.len();

    let mut plan = PartitionPlan {
        fingerprint: partition.fingerprint,
        device_id: partition.device_id,
        size: partition.size,
        inode_groups,
        canonical: None,
        unique_inode_count,
        savings: 0,
        relinks_required: 0,
    };

    if unique_inode_count <= 1 {
        return plan;
    }

    // Strict `>` keeps the first group among equals.
    let mut best = 0;
    for (i, group) in plan.inode_groups.iter().enumerate() {
        if group.len() > plan.inode_groups[best].len() {
            best = i;
        }
    }

    let chosen = &plan.inode_groups[best];
    let Some(first) = chosen.files.first() else {
        return plan;
    };

    plan.relinks_required = total - chosen.len();
    plan.savings = (unique_inode_count as u64 - 1) * partition.size;
    plan.canonical = Some(CanonicalRecord {
        inode_id: chosen.inode_id,
        target: first.path.clone(),
    });

    log::debug!(
        "Partition {} dev={}: keep inode {} ({} paths), {} relink(s)",
        plan.fingerprint.short_hex(),
        plan.device_id,
        chosen.inode_id,
        chosen.len(),
        plan.relinks_required
    );

    plan
}
