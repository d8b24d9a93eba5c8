use super::support::{collect, inode, write_file};
use fidedu::actions::{apply, ApplyConfig};
use fidedu::duplicates::find_duplicates;
use fidedu::scanner::{VisitedDirs, Walker, WalkerConfig};
use std::fs;
use std::os::unix::fs::symlink;
use tempfile::tempdir;

#[test]
fn test_repeated_root_counts_files_once() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"dup");
    write_file(&dir.path().join("b.txt"), b"dup");

    let root = dir.path().to_path_buf();
    let candidates = collect(&[root.clone(), root.clone(), root]);
    assert_eq!(candidates.len(), 2);

    let (dupes, sizes) = find_duplicates(candidates, 2).unwrap();
    let report = apply(&dupes, &sizes, &ApplyConfig::default());
    assert_eq!(report.files_involved, 2);
    assert_eq!(report.relinks_planned, 1);
}

#[test]
fn test_nested_root_is_pruned() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write_file(&dir.path().join("a.txt"), b"content");
    write_file(&sub.join("b.txt"), b"content");

    // Child first: the parent walk must skip the already visited child.
    let candidates = collect(&[sub.clone(), dir.path().to_path_buf()]);
    assert_eq!(candidates.len(), 2);
}

#[test]
fn test_root_given_through_symlink_is_walked_once() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("real");
    fs::create_dir(&real).unwrap();
    write_file(&real.join("a.txt"), b"x");
    let alias = dir.path().join("alias");
    symlink(&real, &alias).unwrap();

    let candidates = collect(&[real, alias]);
    assert_eq!(candidates.len(), 1);
}

#[test]
fn test_symlinked_file_is_never_relinked() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let link = dir.path().join("link.txt");
    write_file(&a, b"linked content");
    write_file(&b, b"linked content");
    symlink(&a, &link).unwrap();

    let candidates = collect(&[dir.path().to_path_buf()]);
    assert_eq!(candidates.len(), 2);

    let (dupes, sizes) = find_duplicates(candidates, 2).unwrap();
    let report = apply(&dupes, &sizes, &ApplyConfig::default().with_dry_run(false));

    assert_eq!(report.relinks_performed, 1);
    assert_eq!(inode(&a), inode(&b));
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
}

#[test]
fn test_symlink_loop_terminates() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write_file(&sub.join("file.txt"), b"data");
    symlink(dir.path(), sub.join("loop")).unwrap();

    let candidates = collect(&[dir.path().to_path_buf()]);
    assert_eq!(candidates.len(), 1);
}

#[test]
fn test_visited_set_spans_separate_walkers() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"a");

    let mut visited = VisitedDirs::new();
    let first = Walker::new(vec![dir.path().to_path_buf()], WalkerConfig::default());
    assert_eq!(first.walk(&mut visited).count(), 1);

    let second = Walker::new(vec![dir.path().to_path_buf()], WalkerConfig::default());
    assert_eq!(second.walk(&mut visited).count(), 0);

    let fresh = Walker::new(vec![dir.path().to_path_buf()], WalkerConfig::default());
    assert_eq!(fresh.walk(&mut VisitedDirs::new()).count(), 1);
}

#[test]
fn test_min_size_excludes_empty_files() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.empty"), b"");
    write_file(&dir.path().join("b.empty"), b"");
    write_file(&dir.path().join("c.txt"), b"c");

    let walker = Walker::new(
        vec![dir.path().to_path_buf()],
        WalkerConfig::default().with_min_size(Some(1)),
    );
    let found: Vec<_> = walker
        .walk(&mut VisitedDirs::new())
        .filter_map(Result::ok)
        .collect();
    assert_eq!(found.len(), 1);
    assert!(found[0].path.ends_with("c.txt"));
}
