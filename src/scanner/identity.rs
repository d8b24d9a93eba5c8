//! Device/inode identity and the attribute header folded into fingerprints.
//!
//! # Overview
//!
//! Several directory entries may name the same storage object (hardlinks).
//! They are told apart from genuine copies by their `(device, inode)` pair,
//! which also decides whether two paths can ever be linked together: a hard
//! link cannot cross a device boundary.
//!
//! # Platform Support
//!
//! - **Unix**: Uses `dev`/`ino` and `mode`/`uid`/`gid`/`mtime` from metadata
//! - **Other**: No identity is available; files are skipped by the walker
//!
//! # Example
//!
//! ```no_run
//! use fidedu::scanner::identity::FileIdentity;
//!
//! let meta = std::fs::symlink_metadata("some/file.txt").unwrap();
//! if let Some(id) = FileIdentity::from_metadata(&meta) {
//!     println!("dev={} ino={}", id.device_id, id.inode_id);
//! }
//! ```

use std::fs::Metadata;

/// Length in bytes of the serialized [`AttributeHeader`].
pub const HEADER_LEN: usize = 28;

/// The `(device, inode)` pair identifying a storage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileIdentity {
    /// Filesystem/volume identifier
    pub device_id: u64,
    /// Storage object identifier within the device
    pub inode_id: u64,
}

impl FileIdentity {
    /// Extract the identity from file metadata.
    ///
    /// Returns `None` if the platform doesn't expose device and inode ids.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            device_id: metadata.dev(),
            inode_id: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        // Windows only exposes the file index through an open handle.
        None
    }

    /// Check if identity extraction is supported on this platform.
    ///
    /// ```
    /// use fidedu::scanner::identity::FileIdentity;
    ///
    /// if !FileIdentity::is_supported() {
    ///     println!("no hardlink support here");
    /// }
    /// ```
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}

/// File attributes that take part in the fingerprint.
///
/// Two files only compare equal when their permission bits, owner, group,
/// size and whole-second modification time all match, so merging them into
/// one inode never changes what a reader observes through `stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeHeader {
    /// Mode bits (type + permissions), truncated to 16 bits
    pub mode: u32,
    /// Owner user id
    pub uid: u32,
    /// Owner group id
    pub gid: u32,
    /// File size in bytes
    pub size: u64,
    /// Modification time in whole seconds since the epoch
    pub mtime_secs: u64,
}

impl AttributeHeader {
    /// Read the attribute header from file metadata.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            mode: metadata.mode() & 0xFFFF,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            // Pre-epoch timestamps wrap; they still compare consistently.
            mtime_secs: metadata.mtime() as u64,
        }
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let mtime_secs = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs());
        Self {
            mode: if metadata.permissions().readonly() {
                0o444
            } else {
                0o644
            },
            uid: 0,
            gid: 0,
            size: metadata.len(),
            mtime_secs,
        }
    }

    /// Serialize to the fixed 28-byte little-endian layout.
    ///
    /// Layout: `mode:u32 | uid:u32 | gid:u32 | size:u64 | mtime_secs:u64`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.mode.to_le_bytes());
        buf[4..8].copy_from_slice(&self.uid.to_le_bytes());
        buf[8..12].copy_from_slice(&self.gid.to_le_bytes());
        buf[12..20].copy_from_slice(&self.size.to_le_bytes());
        buf[20..28].copy_from_slice(&self.mtime_secs.to_le_bytes());
        buf
    }
}
