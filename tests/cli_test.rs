//! Tests running the `dune-archive` binary

use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn dune_archive(dir: &TempDir, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dune-archive"))
        .args(args)
        .current_dir(dir.path())
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("output.txt"), "stale\n").unwrap();

    let result = dune_archive(&dir, &["missing.txt"]);

    assert!(!result.status.success());
    assert_eq!(
        fs::read_to_string(dir.path().join("output.txt")).unwrap(),
        "Error: Input file 'missing.txt' not found\n"
    );
    assert!(String::from_utf8_lossy(&result.stderr).contains("missing.txt"));
}

#[test]
fn test_corrupt_catalog_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("input.txt"), "search record planet Dune\n").unwrap();
    fs::write(dir.path().join("catalog.txt"), "not a catalog line\n").unwrap();

    let result = dune_archive(&dir, &["input.txt"]);

    assert!(!result.status.success());
    let output = fs::read_to_string(dir.path().join("output.txt")).unwrap();
    assert!(output.starts_with("Error initializing catalog:"));
}

#[test]
fn test_runs_script() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("input.txt"),
        "create type planet 2 1 name str size int\ncreate record planet Dune 500\nsearch record planet Dune\n",
    )
    .unwrap();

    let result = dune_archive(&dir, &["input.txt"]);

    assert!(result.status.success());
    assert_eq!(
        fs::read_to_string(dir.path().join("output.txt")).unwrap(),
        "Dune 500\n"
    );
    assert!(dir.path().join("log.csv").exists());
}
