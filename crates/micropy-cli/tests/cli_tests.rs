//! End-to-end tests that invoke the compiled `micropy` binary.
//!
//! Every test points `MICROPY_HOME` at a temporary directory and
//! `MICROPY_SOURCES` at repository documents on disk, so nothing touches
//! the network or the real home directory.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use micropy_test_utils::project::TestProject;
use micropy_test_utils::repo::{micropy_document, micropython_document};
use micropy_test_utils::stubs::{device_stub, firmware_stub};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn write_sources(tp: &TestProject) -> String {
    let first = tp.root().join("micropy.source.json");
    let second = tp.root().join("micropython.source.json");
    fs::write(&first, micropy_document().to_string()).unwrap();
    fs::write(&second, micropython_document().to_string()).unwrap();
    format!("{},{}", first.display(), second.display())
}

/// A `micropy` command isolated to `tp`, run from `dir`.
fn micropy(tp: &TestProject, dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("micropy"));
    cmd.current_dir(dir)
        .env("MICROPY_HOME", tp.home())
        .env("MICROPY_SOURCES", write_sources(tp))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn local_stubs(tp: &TestProject) -> PathBuf {
    let sources = tp.sources();
    firmware_stub(&sources.join("micropython"), "micropython");
    device_stub(&sources.join("esp32"), "esp32", "1.11.0", "micropython");
    sources
}

// ============================================================================
// General
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let tp = TestProject::new();
    micropy(&tp, tp.root())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("stubs"));
}

#[test]
fn test_no_command_prints_hint() {
    let tp = TestProject::new();
    micropy(&tp, tp.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("micropy --help"));
}

// ============================================================================
// init
// ============================================================================

#[test]
fn test_init_creates_project() {
    let tp = TestProject::new();
    micropy(&tp, tp.root())
        .args(["init", tp.project().to_str().unwrap(), "-n", "Blinky"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Blinky"));

    let manifest = tp.read_json("micropy.json");
    assert_eq!(manifest["name"], json!("Blinky"));
    assert_eq!(manifest["stubs"], json!({}));
    assert_eq!(manifest["dev-packages"], json!({"micropy-cli": "*"}));
    tp.assert_file_exists("src/main.py");
    tp.assert_file_exists(".vscode/settings.json");
}

#[test]
fn test_init_with_local_stub() {
    let tp = TestProject::new();
    let sources = local_stubs(&tp);
    micropy(&tp, tp.root())
        .args([
            "init",
            tp.project().to_str().unwrap(),
            "-n",
            "Blinky",
            "-s",
            sources.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("esp32-micropython-1.11.0"));

    assert_eq!(
        tp.read_json("micropy.json")["stubs"],
        json!({"esp32-micropython-1.11.0": "1.3.0"})
    );
    tp.assert_file_exists(".micropy/esp32-micropython-1.11.0");
}

#[test]
fn test_init_twice_fails() {
    let tp = TestProject::new();
    let path = tp.project();
    micropy(&tp, tp.root())
        .args(["init", path.to_str().unwrap()])
        .assert()
        .success();

    micropy(&tp, tp.root())
        .args(["init", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::is_match("(?m)^error: .*already exists").unwrap())
        .stderr(predicate::str::contains("error (").not());
}

// ============================================================================
// install
// ============================================================================

#[test]
fn test_install_editable_package() {
    let tp = TestProject::new();
    micropy(&tp, tp.root())
        .args(["init", tp.project().to_str().unwrap(), "-n", "Blinky"])
        .assert()
        .success();

    micropy(&tp, &tp.project())
        .args(["install", "-e", "./lib/drivers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added"));

    assert_eq!(
        tp.read_json("micropy.json")["packages"],
        json!({"drivers": "-e ./lib/drivers"})
    );
    tp.assert_file_contains("requirements.txt", "-e ./lib/drivers");
}

#[test]
fn test_install_outside_project_fails() {
    let tp = TestProject::new();
    micropy(&tp, tp.root())
        .args(["install", "picoweb"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("micropy init"));
}

// ============================================================================
// stubs
// ============================================================================

#[test]
fn test_stubs_add_then_list() {
    let tp = TestProject::new();
    let sources = local_stubs(&tp);

    micropy(&tp, tp.root())
        .args(["stubs", "add", sources.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("esp32-micropython-1.11.0"))
        .stdout(predicate::str::contains("(firmware)"));

    micropy(&tp, tp.root())
        .args(["stubs", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("micropython"))
        .stdout(predicate::str::contains("esp32-micropython-1.11.0"));
}

#[test]
fn test_stubs_list_empty() {
    let tp = TestProject::new();
    micropy(&tp, tp.root())
        .args(["stubs", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(none)"));
}

#[test]
fn test_stubs_search_spans_repositories() {
    let tp = TestProject::new();
    let assert = micropy(&tp, tp.root())
        .args(["stubs", "search", "stub"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    for name in [
        "esp32-Stubs",
        "micropython-firmware-stubs",
        "micropython-esp32-stubs",
        "micropython-RP2-stubs",
    ] {
        assert!(stdout.contains(name), "missing {name} in:\n{stdout}");
    }
    assert!(!stdout.contains("1.17.0"));
}

#[test]
fn test_stubs_search_without_match_fails() {
    let tp = TestProject::new();
    micropy(&tp, tp.root())
        .args(["stubs", "search", "nothing-like-this"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No stubs match"));
}
