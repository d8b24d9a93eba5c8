//! Directory walker producing deduplication candidates.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one or more
//! root folders and collecting a [`FileCandidate`] for every regular file.
//! It uses [`walkdir`] for a sequential, sorted traversal so that a shared
//! [`VisitedDirs`] set can prune any directory that was already walked.
//!
//! # Features
//!
//! - Multiple roots, canonicalized before walking
//! - Each resolved directory is walked at most once per run
//! - Symbolic links are never followed or returned
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Size filtering (min/max) and hidden file filtering
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use fidedu::scanner::{VisitedDirs, Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     min_size: Some(1024),  // Skip files under 1KB
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(vec![PathBuf::from("/srv/photos")], config);
//! let mut visited = VisitedDirs::new();
//! for entry in walker.walk(&mut visited) {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use super::identity::FileIdentity;
use super::{FileCandidate, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Set of resolved directory paths already traversed in this run.
///
/// Shared across all roots so that overlapping or repeated roots never
/// produce the same file twice.
#[derive(Debug, Default)]
pub struct VisitedDirs {
    seen: HashSet<PathBuf>,
}

impl VisitedDirs {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved directory. Returns `false` if it was already present.
    pub fn insert(&mut self, dir: PathBuf) -> bool {
        self.seen.insert(dir)
    }

    /// Whether the resolved directory was already visited.
    #[must_use]
    pub fn contains(&self, dir: &Path) -> bool {
        self.seen.contains(dir)
    }

    /// Number of directories visited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no directory has been visited yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Directory walker over a list of root folders.
pub struct Walker {
    /// Root folders in the order given
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback, notified once per yielded file
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("roots", &self.roots)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given roots.
    ///
    /// ```
    /// use fidedu::scanner::{Walker, WalkerConfig};
    /// use std::path::PathBuf;
    ///
    /// let walker = Walker::new(vec![PathBuf::from(".")], WalkerConfig::default());
    /// assert_eq!(walker.roots().len(), 1);
    /// ```
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self {
            roots,
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set a progress callback notified for every candidate found.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// The configured roots.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build the gitignore matcher for one root from the configured patterns.
    fn build_gitignore(&self, root: &Path) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    fn should_ignore(
        root: &Path,
        path: &Path,
        is_dir: bool,
        gitignore: Option<&Gitignore>,
    ) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };
        let relative = path.strip_prefix(root).unwrap_or(path);
        if relative.as_os_str().is_empty() {
            return false;
        }
        let normalized = if cfg!(windows) {
            relative.to_string_lossy().replace('\\', "/")
        } else {
            relative.to_string_lossy().into_owned()
        };
        gi.matched(normalized, is_dir).is_ignore()
    }

    fn is_hidden(entry: &walkdir::DirEntry) -> bool {
        entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
    }

    fn passes_size_filter(&self, size: u64) -> bool {
        if let Some(min) = self.config.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.config.max_size {
            if size > max {
                return false;
            }
        }
        true
    }

    /// Walk every root, yielding one candidate per regular file.
    ///
    /// Directories already present in `visited` are pruned, and every
    /// directory walked is added to it. Errors are yielded as [`ScanError`]
    /// values rather than stopping iteration; files that vanish between
    /// listing and `lstat` are skipped silently.
    pub fn walk<'a>(
        &'a self,
        visited: &'a mut VisitedDirs,
    ) -> impl Iterator<Item = Result<FileCandidate, ScanError>> + 'a {
        WalkIter {
            walker: self,
            visited,
            roots: self.roots.iter(),
            current: None,
            found: 0,
        }
    }

    /// Resolve a root and prepare its traversal, or `None` if it is unusable.
    fn open_root(&self, root: &Path) -> Option<RootWalk> {
        let resolved = match root.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Skipping root {}: {}", root.display(), e);
                return None;
            }
        };
        if !resolved.is_dir() {
            log::warn!("Skipping root {}: not a directory", root.display());
            return None;
        }

        let gitignore = self.build_gitignore(&resolved);
        let iter = walkdir::WalkDir::new(&resolved)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        log::debug!("Walking root {}", resolved.display());
        Some(RootWalk {
            root: resolved,
            iter,
            gitignore,
        })
    }
}

struct RootWalk {
    root: PathBuf,
    iter: walkdir::IntoIter,
    gitignore: Option<Gitignore>,
}

struct WalkIter<'a> {
    walker: &'a Walker,
    visited: &'a mut VisitedDirs,
    roots: std::slice::Iter<'a, PathBuf>,
    current: Option<RootWalk>,
    found: usize,
}

impl WalkIter<'_> {
    /// Handle one directory entry. Returns `Some` when something is yielded.
    fn visit(
        &mut self,
        entry: walkdir::DirEntry,
    ) -> Option<Result<FileCandidate, ScanError>> {
        let walker = self.walker;
        let rw = self.current.as_mut()?;
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            let prune = (walker.config.skip_hidden && Walker::is_hidden(&entry))
                || Walker::should_ignore(&rw.root, path, true, rw.gitignore.as_ref());
            if prune {
                log::trace!("Ignoring directory: {}", path.display());
                rw.iter.skip_current_dir();
                return None;
            }

            let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            if !self.visited.insert(resolved) {
                log::debug!("Directory already visited: {}", path.display());
                rw.iter.skip_current_dir();
            }
            return None;
        }

        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", path.display());
            return None;
        }

        if walker.config.skip_hidden && Walker::is_hidden(&entry) {
            return None;
        }
        if Walker::should_ignore(&rw.root, path, false, rw.gitignore.as_ref()) {
            log::trace!("Ignoring file: {}", path.display());
            return None;
        }

        let metadata = match std::fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::trace!("File vanished during walk: {}", path.display());
                return None;
            }
            Err(e) => return Some(Err(ScanError::from_io(path, e))),
        };

        // FIFOs, sockets and devices are never candidates.
        if !metadata.is_file() {
            return None;
        }

        if !walker.passes_size_filter(metadata.len()) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                metadata.len(),
                path.display()
            );
            return None;
        }

        let owned = entry.into_path();
        if FileIdentity::from_metadata(&metadata).is_none() {
            return Some(Err(ScanError::NoIdentity(owned)));
        }
        FileCandidate::from_metadata(owned, &metadata).map(Ok)
    }
}

impl Iterator for WalkIter<'_> {
    type Item = Result<FileCandidate, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.walker.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            if self.current.is_none() {
                let root = self.roots.next()?;
                self.current = self.walker.open_root(root);
                continue;
            }
            let rw = self.current.as_mut()?;

            match rw.iter.next() {
                None => {
                    self.current = None;
                }
                Some(Ok(entry)) => {
                    if let Some(item) = self.visit(entry) {
                        if let (Ok(file), Some(cb)) = (&item, &self.walker.progress_callback) {
                            self.found += 1;
                            cb.on_progress(self.found, &file.path.to_string_lossy());
                        }
                        return Some(item);
                    }
                }
                Some(Err(e)) => {
                    let path = e
                        .path()
                        .map_or_else(|| rw.root.clone(), Path::to_path_buf);
                    if e.io_error().is_some_and(|io| io.kind() == ErrorKind::NotFound) {
                        log::trace!("Entry vanished during walk: {}", path.display());
                        continue;
                    }
                    let io = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    return Some(Err(ScanError::from_io(&path, io)));
                }
            }
        }
    }
}
