use fidedu::scanner::{FileCandidate, VisitedDirs, Walker, WalkerConfig};
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Fixed mtime so copies written in different seconds still match.
pub const MTIME: i64 = 1_600_000_000;

pub fn write_file(path: &Path, content: &[u8]) {
    fs::write(path, content).unwrap();
    set_file_mtime(path, FileTime::from_unix_time(MTIME, 0)).unwrap();
}

pub fn inode(path: &Path) -> u64 {
    fs::metadata(path).unwrap().ino()
}

pub fn nlink(path: &Path) -> u64 {
    fs::metadata(path).unwrap().nlink()
}

pub fn collect(roots: &[PathBuf]) -> Vec<FileCandidate> {
    let walker = Walker::new(roots.to_vec(), WalkerConfig::default());
    let mut visited = VisitedDirs::new();
    walker.walk(&mut visited).filter_map(Result::ok).collect()
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}
