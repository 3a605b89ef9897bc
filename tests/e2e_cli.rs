//! CLI end-to-end tests
//!
//! Tests for pixelstore command-line interface.

mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the pixelstore binary
#[allow(deprecated)]
fn pixelstore_cmd() -> Command {
    Command::cargo_bin("pixelstore").unwrap()
}

fn write_config(dir: &Path, root: &Path, extra: &str) -> std::path::PathBuf {
    let config_file = dir.join("pixelstore.toml");
    fs::write(
        &config_file,
        format!(
            r#"
[server]
host = "127.0.0.1"
port = 8080

[storage]
root = "{}"
{}
"#,
            root.display(),
            extra
        ),
    )
    .unwrap();
    config_file
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = pixelstore_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = pixelstore_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pixelstore"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = pixelstore_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pixelstore"));
}

#[test]
fn test_cli_check_tools_lists_stages() {
    let temp = tempdir().unwrap();
    let config = write_config(temp.path(), temp.path(), "");

    let mut cmd = pixelstore_cmd();
    cmd.args(["check-tools", "--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("jpegtran"))
        .stdout(predicate::str::contains("mozjpeg (cjpeg)"))
        .stdout(predicate::str::contains("webp (cwebp)"));
}

#[test]
fn test_cli_validate_config() {
    let temp = tempdir().unwrap();
    let config = write_config(
        temp.path(),
        temp.path(),
        "\n[compression.jpegtran]\nactive = true\n",
    );

    let mut cmd = pixelstore_cmd();
    cmd.args(["validate", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("jpegtran"));
}

#[test]
fn test_cli_validate_rejects_port_zero() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("bad.toml");
    fs::write(&config_file, "[server]\nport = 0\n").unwrap();

    let mut cmd = pixelstore_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("port"));
}

#[test]
fn test_cli_save_read_exists() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("images");
    let config = write_config(temp.path(), &root, "");

    let source = temp.path().join("Sunset Beach.png");
    let png = common::compressible_png();
    fs::write(&source, &png).unwrap();

    pixelstore_cmd()
        .args([
            "save",
            "--config",
            config.to_str().unwrap(),
            "--target-dir",
            "2024/05",
            source.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("/content/images/2024/05/Sunset-Beach.png"));

    let out = temp.path().join("copy.png");
    pixelstore_cmd()
        .args([
            "read",
            "--config",
            config.to_str().unwrap(),
            "2024/05/Sunset-Beach.png",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert_eq!(fs::read(&out).unwrap(), png);

    pixelstore_cmd()
        .args([
            "exists",
            "--config",
            config.to_str().unwrap(),
            "--target-dir",
            "2024/05",
            "Sunset-Beach.png",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));

    pixelstore_cmd()
        .args([
            "exists",
            "--config",
            config.to_str().unwrap(),
            "missing.png",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));
}

#[test]
fn test_cli_read_missing_reports_path() {
    let temp = tempdir().unwrap();
    let config = write_config(temp.path(), temp.path(), "");

    pixelstore_cmd()
        .args([
            "read",
            "--config",
            config.to_str().unwrap(),
            "2020/01/missing.jpg",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Image not found: 2020/01/missing.jpg"));
}

#[test]
fn test_cli_messages_follow_locale() {
    let temp = tempdir().unwrap();
    let config = write_config(temp.path(), temp.path(), "locale = \"es\"");

    pixelstore_cmd()
        .args([
            "read",
            "--config",
            config.to_str().unwrap(),
            "nada.png",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Imagen no encontrada: nada.png"));
}

#[test]
fn test_cli_save_nonexistent_file() {
    let mut cmd = pixelstore_cmd();
    cmd.args(["save", "/nonexistent/path/photo.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not exist"));
}

#[test]
fn test_cli_start_invalid_port() {
    let mut cmd = pixelstore_cmd();
    cmd.args(["start", "--port", "99999"]).assert().failure();
}
