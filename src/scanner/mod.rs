//! Scanner module for candidate discovery and file fingerprinting.
//!
//! This module provides functionality for:
//! - Recursive directory walking over one or more roots
//! - Device/inode identity extraction for hardlink-aware grouping
//! - Attribute + content fingerprinting with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal producing [`FileCandidate`]s
//! - [`identity`]: Device/inode identity and the attribute header
//! - [`hasher`]: Streaming fingerprint computation
//!
//! # Example
//!
//! ```no_run
//! use fidedu::scanner::{VisitedDirs, Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], WalkerConfig::default());
//! let mut visited = VisitedDirs::new();
//! for entry in walker.walk(&mut visited) {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes (dev {}, ino {})",
//!             file.path.display(), file.size, file.device_id, file.inode_id),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod identity;
pub mod walker;

use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{Fingerprint, Hasher, DEFAULT_BUFFER_SIZE};
pub use identity::{AttributeHeader, FileIdentity};
pub use walker::{VisitedDirs, Walker};

/// A regular file considered for deduplication.
///
/// Produced once per regular file observed by the walker and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileCandidate {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Filesystem/volume the file lives on
    pub device_id: u64,
    /// Storage object the path refers to
    pub inode_id: u64,
}

impl FileCandidate {
    /// Create a new candidate.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, device_id: u64, inode_id: u64) -> Self {
        Self {
            path,
            size,
            device_id,
            inode_id,
        }
    }

    /// Build a candidate from a path and its (lstat) metadata.
    ///
    /// Returns `None` when the platform cannot report device and inode ids.
    #[must_use]
    pub fn from_metadata(path: PathBuf, metadata: &std::fs::Metadata) -> Option<Self> {
        let identity = FileIdentity::from_metadata(metadata)?;
        Some(Self {
            path,
            size: metadata.len(),
            device_id: identity.device_id,
            inode_id: identity.inode_id,
        })
    }

    /// The device/inode pair of this candidate.
    #[must_use]
    pub fn identity(&self) -> FileIdentity {
        FileIdentity {
            device_id: self.device_id,
            inode_id: self.inode_id,
        }
    }
}

/// Configuration for directory walking.
///
/// Symbolic links are never followed.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    /// Set hidden file skipping.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, size: Option<u64>) -> Self {
        self.min_size = size;
        self
    }

    /// Set the maximum file size.
    #[must_use]
    pub fn with_max_size(mut self, size: Option<u64>) -> Self {
        self.max_size = size;
        self
    }

    /// Set the ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The platform cannot report a device/inode identity for this file.
    #[error("No device/inode identity available: {0}")]
    NoIdentity(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur while fingerprinting a file.
///
/// All of these are non-fatal: the file is dropped from its group and the
/// batch continues.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file disappeared before it could be read.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing was abandoned because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),
}

impl HashError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The path this error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Interrupted(p)
            | Self::Io { path: p, .. } => p,
        }
    }

    /// Whether this error was caused by a shutdown request.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}
