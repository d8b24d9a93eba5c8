use super::support::{collect, inode, nlink, write_file};
use fidedu::actions::{apply, ApplyConfig};
use fidedu::duplicates::{find_duplicates, DuplicateFinder, FinderConfig};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use tempfile::tempdir;

fn run(dir: &std::path::Path, dry_run: bool) -> fidedu::actions::DedupReport {
    let candidates = collect(&[dir.to_path_buf()]);
    let (dupes, sizes) = find_duplicates(candidates, 2).unwrap();
    apply(&dupes, &sizes, &ApplyConfig::default().with_dry_run(dry_run))
}

#[test]
fn test_shared_inode_plus_copy_needs_one_relink() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    let c = dir.path().join("c.bin");
    write_file(&a, &[7u8; 100]);
    fs::hard_link(&a, &b).unwrap();
    write_file(&c, &[7u8; 100]);

    let report = run(dir.path(), false);

    assert_eq!(report.duplicate_set_count, 1);
    assert_eq!(report.files_involved, 3);
    assert_eq!(report.relinks_planned, 1);
    assert_eq!(report.bytes_reclaimable, 100);
    assert_eq!(report.relinks_performed, 1);
    assert!(!report.has_warnings());

    assert_eq!(inode(&a), inode(&b));
    assert_eq!(inode(&a), inode(&c));
    assert_eq!(nlink(&a), 3);
    assert_eq!(fs::read(&c).unwrap(), vec![7u8; 100]);
}

#[test]
fn test_second_run_is_a_no_op() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("one.txt"), b"same content");
    write_file(&dir.path().join("two.txt"), b"same content");
    write_file(&dir.path().join("three.txt"), b"same content");

    let first = run(dir.path(), false);
    assert_eq!(first.relinks_performed, 2);
    assert_eq!(first.bytes_reclaimable, 24);

    let second = run(dir.path(), false);
    assert_eq!(second.duplicate_set_count, 1);
    assert_eq!(second.files_involved, 3);
    assert_eq!(second.relinks_planned, 0);
    assert_eq!(second.bytes_reclaimable, 0);
    assert_eq!(second.relinks_performed, 0);
}

#[test]
fn test_dry_run_leaves_files_untouched() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"duplicate");
    write_file(&b, b"duplicate");
    let before = (inode(&a), inode(&b));

    let report = run(dir.path(), true);

    assert!(report.dry_run);
    assert_eq!(report.relinks_planned, 1);
    assert_eq!(report.bytes_reclaimable, 9);
    assert_eq!(report.relinks_performed, 0);
    assert_eq!((inode(&a), inode(&b)), before);
    assert_ne!(inode(&a), inode(&b));
}

#[test]
fn test_largest_inode_group_is_kept() {
    let dir = tempdir().unwrap();
    let lone = dir.path().join("a_lone.txt");
    let linked1 = dir.path().join("b_linked.txt");
    let linked2 = dir.path().join("c_linked.txt");
    write_file(&lone, b"payload");
    write_file(&linked1, b"payload");
    fs::hard_link(&linked1, &linked2).unwrap();
    let kept = inode(&linked1);

    let report = run(dir.path(), false);

    assert_eq!(report.relinks_planned, 1);
    assert_eq!(inode(&lone), kept);
    assert_eq!(inode(&linked2), kept);
}

#[test]
fn test_first_encountered_wins_tie() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("a.txt");
    let second = dir.path().join("b.txt");
    write_file(&first, b"tie");
    write_file(&second, b"tie");
    let kept = inode(&first);

    run(dir.path(), false);

    assert_eq!(inode(&second), kept);
}

#[test]
fn test_different_mtime_is_not_duplicate() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"content");
    write_file(&b, b"content");
    filetime::set_file_mtime(&b, filetime::FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

    let report = run(dir.path(), false);
    assert!(report.is_empty());
    assert_ne!(inode(&a), inode(&b));
}

#[test]
fn test_sub_second_mtime_difference_is_ignored() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"content");
    write_file(&b, b"content");
    let late = filetime::FileTime::from_unix_time(super::support::MTIME, 500_000_000);
    filetime::set_file_mtime(&b, late).unwrap();

    let report = run(dir.path(), true);
    assert_eq!(report.duplicate_set_count, 1);
}

#[test]
fn test_different_mode_is_not_duplicate() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"content");
    write_file(&b, b"content");
    fs::set_permissions(&a, fs::Permissions::from_mode(0o600)).unwrap();
    fs::set_permissions(&b, fs::Permissions::from_mode(0o644)).unwrap();

    let report = run(dir.path(), true);
    assert!(report.is_empty());
}

#[test]
fn test_same_size_different_content() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"aaaa");
    write_file(&dir.path().join("b.txt"), b"bbbb");

    let report = run(dir.path(), false);
    assert!(report.is_empty());
    assert_eq!(report.relinks_performed, 0);
}

#[test]
fn test_empty_files_are_linked() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.empty");
    let b = dir.path().join("b.empty");
    write_file(&a, b"");
    write_file(&b, b"");

    let report = run(dir.path(), false);

    assert_eq!(report.duplicate_set_count, 1);
    assert_eq!(report.bytes_reclaimable, 0);
    assert_eq!(report.relinks_performed, 1);
    assert_eq!(inode(&a), inode(&b));
}

#[test]
fn test_duplicates_across_two_roots() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    let a = dir1.path().join("photo.jpg");
    let b = dir2.path().join("copy.jpg");
    write_file(&a, &[1u8; 4096]);
    write_file(&b, &[1u8; 4096]);

    let candidates = collect(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()]);
    let outcome = DuplicateFinder::new(FinderConfig::default().with_workers(3))
        .find_duplicates(candidates)
        .unwrap();
    assert_eq!(outcome.summary.total_files, 2);
    assert_eq!(outcome.summary.hashed_files, 2);

    let report = apply(
        &outcome.duplicates,
        &outcome.sizes,
        &ApplyConfig::default().with_dry_run(false),
    );

    assert_eq!(report.relinks_performed, 1);
    assert_eq!(inode(&a), inode(&b));
}

#[test]
fn test_many_sets_in_nested_directories() {
    let dir = tempdir().unwrap();
    for sub in ["x", "y", "z"] {
        let d = dir.path().join(sub);
        fs::create_dir(&d).unwrap();
        for i in 0..4u8 {
            write_file(&d.join(format!("f{i}")), &vec![i; 64 + usize::from(i)]);
        }
    }

    let report = run(dir.path(), false);

    assert_eq!(report.duplicate_set_count, 4);
    assert_eq!(report.files_involved, 12);
    assert_eq!(report.relinks_planned, 8);
    assert_eq!(report.relinks_performed, 8);
    for i in 0..4u8 {
        let name = format!("f{i}");
        let ino = inode(&dir.path().join("x").join(&name));
        assert_eq!(inode(&dir.path().join("y").join(&name)), ino);
        assert_eq!(inode(&dir.path().join("z").join(&name)), ino);
    }
}

#[test]
fn test_verbose_report_lists_members() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"listed");
    write_file(&dir.path().join("b.txt"), b"listed");

    let candidates = collect(&[dir.path().to_path_buf()]);
    let (dupes, sizes) = find_duplicates(candidates, 1).unwrap();
    let report = apply(&dupes, &sizes, &ApplyConfig::default().with_verbose(true));

    assert_eq!(report.partitions.len(), 1);
    let partition = &report.partitions[0];
    assert_eq!(partition.size, 6);
    assert_eq!(partition.unique_inodes, 2);
    assert_eq!(partition.paths.len(), 2);
    assert_eq!(partition.fingerprint.len(), 16);
    assert!(partition.canonical.as_ref().unwrap().ends_with("a.txt"));
}
