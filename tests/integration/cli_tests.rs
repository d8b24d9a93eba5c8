use super::support::{inode, path_str, write_file};
use clap::Parser;
use fidedu::cli::Cli;
use fidedu::error::ExitCode;
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["fidedu", "--no-progress", "-q"];
    argv.extend_from_slice(args);
    fidedu::run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_exit_code_no_duplicates() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("unique.txt"), b"unique");

    let result = run(&[path_str(dir.path())]).unwrap();
    assert_eq!(result, ExitCode::NoDuplicates);
}

#[test]
fn test_dry_run_by_default() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"dup");
    write_file(&b, b"dup");

    let result = run(&[path_str(dir.path()), "--output", "json"]).unwrap();
    assert_eq!(result, ExitCode::Success);
    assert_ne!(inode(&a), inode(&b));
}

#[test]
fn test_compress_relinks() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"dup");
    write_file(&b, b"dup");

    let result = run(&["--compress", path_str(dir.path())]).unwrap();
    assert_eq!(result, ExitCode::Success);
    assert_eq!(inode(&a), inode(&b));
}

#[test]
fn test_compress_twice_is_idempotent() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"dup");
    write_file(&b, b"dup");

    run(&["-c", path_str(dir.path())]).unwrap();
    let linked = inode(&a);
    let result = run(&["-c", path_str(dir.path())]).unwrap();

    assert_eq!(result, ExitCode::Success);
    assert_eq!(inode(&a), linked);
    assert_eq!(inode(&b), linked);
}

#[test]
fn test_min_size_filters_candidates() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"tiny");
    write_file(&dir.path().join("b.txt"), b"tiny");

    let result = run(&[path_str(dir.path()), "--min-size", "1KB"]).unwrap();
    assert_eq!(result, ExitCode::NoDuplicates);
}

#[test]
fn test_ignore_pattern_excludes_files() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.bak");
    write_file(&a, b"dup");
    write_file(&b, b"dup");

    let result = run(&["-c", path_str(dir.path()), "-i", "*.bak"]).unwrap();
    assert_eq!(result, ExitCode::NoDuplicates);
    assert_ne!(inode(&a), inode(&b));
}

#[test]
fn test_missing_root_is_not_fatal() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let result = run(&[path_str(&missing)]).unwrap();
    assert_eq!(result, ExitCode::NoDuplicates);
}

#[test]
fn test_missing_config_file_is_fatal() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("absent.toml");

    let result = run(&["--config", path_str(&config), path_str(dir.path())]);
    assert!(result.is_err());
}

#[test]
fn test_config_file_is_applied() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    write_file(&data.join("a.txt"), b"dup");
    write_file(&data.join("b.txt"), b"dup");
    let config = dir.path().join("fidedu.toml");
    std::fs::write(&config, "min_size = 100\nworkers = 2\n").unwrap();

    let result = run(&["--config", path_str(&config), path_str(&data)]).unwrap();
    assert_eq!(result, ExitCode::NoDuplicates);
}
