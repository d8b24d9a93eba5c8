use super::support::{collect, inode, path_str, write_file};
use clap::Parser;
use fidedu::actions::{apply, ApplyConfig};
use fidedu::cli::Cli;
use fidedu::duplicates::{DuplicateFinder, DuplicateSet, FinderConfig, SizeByFingerprint};
use fidedu::error::ExitCode;
use fidedu::output::TextReport;
use fidedu::scanner::{FileCandidate, Fingerprint, HashError};
use std::fs::{self, File};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use tempfile::tempdir;

fn set_mode(path: &Path, mode: u32) {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

/// Permission bits do not stop privileged users; those runs skip the test.
fn unreadable_is_enforced(path: &Path) -> bool {
    File::open(path).is_err()
}

#[test]
fn test_unreadable_file_is_skipped() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let locked = dir.path().join("c.txt");
    write_file(&a, b"shared");
    write_file(&b, b"shared");
    write_file(&locked, b"shared");
    set_mode(&locked, 0o000);

    if !unreadable_is_enforced(&locked) {
        set_mode(&locked, 0o644);
        return;
    }

    let candidates = collect(&[dir.path().to_path_buf()]);
    assert_eq!(candidates.len(), 3);

    let outcome = DuplicateFinder::new(FinderConfig::default().with_workers(2))
        .find_duplicates(candidates)
        .unwrap();
    set_mode(&locked, 0o644);

    assert_eq!(outcome.summary.hash_errors.len(), 1);
    assert!(matches!(
        outcome.summary.hash_errors[0],
        HashError::PermissionDenied(_)
    ));
    assert_eq!(outcome.summary.hashed_files, 2);

    let report = apply(
        &outcome.duplicates,
        &outcome.sizes,
        &ApplyConfig::default().with_dry_run(false),
    );
    assert_eq!(report.files_involved, 2);
    assert_eq!(report.relinks_performed, 1);
    assert_eq!(inode(&a), inode(&b));
    assert_ne!(inode(&a), inode(&locked));
}

#[test]
fn test_vanished_file_is_skipped_silently() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    for p in [&a, &b, &c] {
        write_file(p, b"ephemeral");
    }

    let candidates = collect(&[dir.path().to_path_buf()]);
    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(candidates)
        .unwrap();
    fs::remove_file(&b).unwrap();

    let report = apply(
        &outcome.duplicates,
        &outcome.sizes,
        &ApplyConfig::default().with_dry_run(false),
    );

    assert_eq!(report.relinks_planned, 2);
    assert_eq!(report.relinks_performed, 1);
    assert_eq!(report.vanished.len(), 1);
    assert!(report.vanished[0].ends_with("b.txt"));
    assert!(!report.has_warnings());
    assert_eq!(inode(&a), inode(&c));
    assert!(!b.exists());
}

#[test]
fn test_missing_canonical_target_unlinks_nothing() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    for p in [&a, &b, &c] {
        write_file(p, b"keep me");
    }

    let candidates = collect(&[dir.path().to_path_buf()]);
    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(candidates)
        .unwrap();
    // "a.txt" is first encountered, so it is the canonical target.
    fs::remove_file(&a).unwrap();

    let report = apply(
        &outcome.duplicates,
        &outcome.sizes,
        &ApplyConfig::default().with_dry_run(false),
    );

    assert_eq!(report.relinks_performed, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(report.data_loss.is_empty());
    assert_eq!(fs::read(&b).unwrap(), b"keep me");
    assert_eq!(fs::read(&c).unwrap(), b"keep me");
}

#[test]
fn test_read_only_directory_keeps_path_intact() {
    let dir = tempdir().unwrap();
    let writable = dir.path().join("a_writable");
    let sealed = dir.path().join("b_sealed");
    fs::create_dir(&writable).unwrap();
    fs::create_dir(&sealed).unwrap();
    let original = writable.join("file.bin");
    let copy = sealed.join("file.bin");
    write_file(&original, &[9u8; 32]);
    write_file(&copy, &[9u8; 32]);

    let candidates = collect(&[dir.path().to_path_buf()]);
    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(candidates)
        .unwrap();

    set_mode(&sealed, 0o555);
    if File::create(sealed.join("probe")).is_ok() {
        set_mode(&sealed, 0o755);
        return;
    }

    let report = apply(
        &outcome.duplicates,
        &outcome.sizes,
        &ApplyConfig::default().with_dry_run(false),
    );
    set_mode(&sealed, 0o755);

    assert_eq!(report.relinks_performed, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("b_sealed/file.bin"));
    assert!(report.data_loss.is_empty());
    assert!(report.has_warnings());
    assert_eq!(fs::read(&copy).unwrap(), vec![9u8; 32]);
    assert_ne!(inode(&original), inode(&copy));
}

#[test]
fn test_run_app_reports_partial_success() {
    let dir = tempdir().unwrap();
    let locked = dir.path().join("c.txt");
    write_file(&dir.path().join("a.txt"), b"dup");
    write_file(&dir.path().join("b.txt"), b"dup");
    write_file(&locked, b"dup");
    set_mode(&locked, 0o000);

    if !unreadable_is_enforced(&locked) {
        set_mode(&locked, 0o644);
        return;
    }

    let cli = Cli::try_parse_from([
        "fidedu",
        path_str(dir.path()),
        "--output",
        "json",
        "--no-progress",
    ])
    .unwrap();
    let result = fidedu::run_app(cli).unwrap();
    set_mode(&locked, 0o644);

    assert_eq!(result, ExitCode::PartialSuccess);
}

#[test]
fn test_failed_link_after_removal_is_reported_as_lost() {
    let dir = tempdir().unwrap();
    // A directory as canonical target: it exists, but cannot be hard linked.
    let target = dir.path().join("target");
    fs::create_dir(&target).unwrap();
    let victim = dir.path().join("victim.bin");
    write_file(&victim, b"payload");

    let candidate = |path: &Path| {
        let meta = fs::symlink_metadata(path).unwrap();
        FileCandidate::new(path.to_path_buf(), 7, meta.dev(), meta.ino())
    };
    let files = vec![candidate(&target), candidate(&victim)];
    let fp = Fingerprint([5; 32]);
    let mut set = DuplicateSet::new();
    set.insert(fp, files[0].device_id, files);
    let mut sizes = SizeByFingerprint::new();
    sizes.insert(fp, 7);

    let report = apply(&set, &sizes, &ApplyConfig::default().with_dry_run(false));

    assert_eq!(report.relinks_planned, 1);
    assert_eq!(report.relinks_performed, 0);
    assert_eq!(report.data_loss, vec![victim.clone()]);
    assert!(report.failures.is_empty());
    assert!(report.has_warnings());
    assert!(!victim.exists());
    assert!(target.is_dir());

    assert_eq!(fidedu::exit_code_for(&report, 0), ExitCode::PartialSuccess);
    let text = TextReport::new(&report).render();
    assert!(text.contains(&format!("  [lost] {}\n", victim.display())));
    assert!(text.contains("Relinked 0 file(s)."));
}
