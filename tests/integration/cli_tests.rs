//! Binary-level tests.
//!
//! Tests verify:
//! - A successful run exits cleanly and writes both artifacts
//! - Every halting error is reported as exactly one `Error:` line

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

use super::test_utils::{create_sem_tiff, write_file, ByteOrderType};

fn semmeta(image: &Path, output_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("semmeta");
    cmd.arg(image)
        .arg("--output-dir")
        .arg(output_dir)
        .env_remove("RUST_LOG");
    cmd
}

/// Run the binary and return its stderr, asserting a failed exit.
fn failing_stderr(mut cmd: Command) -> String {
    let output = cmd
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    String::from_utf8_lossy(&output).into_owned()
}

fn assert_single_error(stderr: &str, needle: &str) {
    let mentions: Vec<&str> = stderr.lines().filter(|l| l.contains(needle)).collect();
    assert_eq!(mentions.len(), 1, "expected one line mentioning {needle:?}:\n{stderr}");
    assert!(mentions[0].starts_with("Error: "), "got {:?}", mentions[0]);
    assert_eq!(stderr.lines().filter(|l| l.starts_with("Error:")).count(), 1);
}

#[test]
fn test_successful_run() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_file(
        dir.path(),
        "sample.tif",
        &create_sem_tiff(ByteOrderType::LittleEndian),
    );
    let out = dir.path().join("out");

    semmeta(&image, &out).arg("--no-render").assert().success();

    assert!(out.join("sample_raw.json").exists());
    assert!(out.join("sample_cleaned.json").exists());
}

#[test]
fn test_unsupported_format_reports_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_file(
        dir.path(),
        "photo.png",
        &create_sem_tiff(ByteOrderType::LittleEndian),
    );
    let out = dir.path().join("out");

    let stderr = failing_stderr(semmeta(&image, &out));
    assert_single_error(&stderr, "unsupported format");
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
}

#[test]
fn test_corrupt_image_reports_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_file(dir.path(), "bad.tif", b"garbage");
    let out = dir.path().join("out");

    let stderr = failing_stderr(semmeta(&image, &out));
    assert_single_error(&stderr, "corrupt or unreadable");
}

#[test]
fn test_invalid_config_reports_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    let mut cmd = semmeta(Path::new("sample.tif"), &out);
    cmd.arg("--extensions").arg(" ");
    let stderr = failing_stderr(cmd);
    assert_single_error(&stderr, "extension");
}
