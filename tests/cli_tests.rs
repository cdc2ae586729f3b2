//! CLI interface tests

mod common;

use assert_cmd::Command;
use common::{SIMPLE_TEMPLATE, build_zip, simple_config, zip_entry};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_source(dir: &Path) -> std::path::PathBuf {
    let source = dir.join("app.zip");
    let archive = build_zip(&[
        ("index.html", b"<html/>"),
        ("META-INF/deployment-template.xml", SIMPLE_TEMPLATE.as_bytes()),
        ("deploy.properties", b""),
    ]);
    fs::write(&source, archive).unwrap();
    source
}

fn deployconf() -> Command {
    let mut cmd = Command::cargo_bin("deployconf").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("DEPLOYCONF_REPO");
    cmd
}

#[test]
fn test_version_flag() {
    deployconf()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("deployconf"));
}

#[test]
fn test_short_version_flag() {
    deployconf()
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    deployconf()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Apply deployment configuration to a zip archive",
        ))
        .stdout(predicate::str::contains("--force-interactive"));
}

#[test]
fn test_missing_arguments() {
    deployconf().assert().failure();
}

#[test]
fn test_interactive_flags_conflict() {
    deployconf()
        .args(["-i", "-I", "in.zip", "out.zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_first_run_is_incomplete() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_source(temp_dir.path());
    let destination = temp_dir.path().join("out.zip");
    let repo = temp_dir.path().join("repo");

    deployconf()
        .arg("-r")
        .arg(&repo)
        .arg(&source)
        .arg(&destination)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("incomplete"));

    let saved = fs::read_to_string(repo.join("deployment-config.xml")).unwrap();
    assert!(saved.contains("<name>x</name>"));
    assert!(!destination.exists());
}

#[test]
fn test_repository_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_source(temp_dir.path());
    let repo = temp_dir.path().join("env-repo");

    deployconf()
        .env("DEPLOYCONF_REPO", &repo)
        .arg(&source)
        .arg(temp_dir.path().join("out.zip"))
        .assert()
        .code(2);

    assert!(repo.join("deployment-config.xml").exists());
}

#[test]
fn test_configured_run_with_explicit_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_source(temp_dir.path());
    let destination = temp_dir.path().join("out.zip");
    let config = temp_dir.path().join("my-config.xml");
    fs::write(&config, simple_config("hello")).unwrap();

    deployconf()
        .arg("-q")
        .arg("-r")
        .arg(temp_dir.path().join("repo"))
        .arg("-f")
        .arg(&config)
        .arg(&source)
        .arg(&destination)
        .assert()
        .success();

    let archive = fs::read(&destination).unwrap();
    assert_eq!(
        zip_entry(&archive, "deploy.properties").unwrap(),
        b"\n#\n# The x value\n#\nx=hello\n"
    );
    assert!(zip_entry(&archive, "META-INF/deployment-template.xml").is_none());
}

#[test]
fn test_missing_input_archive() {
    let temp_dir = TempDir::new().unwrap();

    deployconf()
        .arg("-r")
        .arg(temp_dir.path().join("repo"))
        .arg(temp_dir.path().join("missing.zip"))
        .arg(temp_dir.path().join("out.zip"))
        .assert()
        .failure()
        .code(5)
        .stdout(predicate::str::contains("Failed to open"));
}

#[test]
fn test_archive_without_template() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("plain.zip");
    fs::write(&source, build_zip(&[("index.html", b"<html/>")])).unwrap();

    deployconf()
        .arg("-r")
        .arg(temp_dir.path().join("repo"))
        .arg(&source)
        .arg(temp_dir.path().join("out.zip"))
        .assert()
        .failure()
        .code(3)
        .stdout(predicate::str::contains("No deployment template file found"));
}

#[test]
fn test_repository_path_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_source(temp_dir.path());
    let repo = temp_dir.path().join("repo");
    fs::write(&repo, "not a directory").unwrap();

    deployconf()
        .arg("-r")
        .arg(&repo)
        .arg(&source)
        .arg(temp_dir.path().join("out.zip"))
        .assert()
        .failure()
        .code(5);
}
