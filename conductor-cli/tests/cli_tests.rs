use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

const SETTINGS: &str = "settings:\n  settle_delay_ms: 1\n  readiness_timeout_ms: 200\n  readiness_poll_ms: 5\n";

fn conductor_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("conductor"));
    cmd.env("NO_COLOR", "1").env("RUST_LOG", "warn");
    cmd
}

fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(&path, content).expect("write file");
    path
}

/// core (critical) + fab (optional, fails) + panel (optional, needs core).
fn degraded_suite(dir: &Path) -> PathBuf {
    write(
        dir,
        "components/core.yaml",
        "name: Core Utilities\nversion: 2.0.0\nutilities:\n  theme: dark\n",
    );
    write(dir, "components/fab.yaml", "fail: no mount point\n");
    write(
        dir,
        "components/panel.yaml",
        "requires: [core]\nelements: [panel-root]\ncommands: [toggle-panel]\n",
    );
    write(
        dir,
        "manifest.yaml",
        &format!(
            "{SETTINGS}components:\n  - {{ id: core, name: Core Utilities, locator: components/core.yaml, critical: true }}\n  - {{ id: fab, name: Floating Button, locator: components/fab.yaml }}\n  - {{ id: panel, name: Side Panel, locator: components/panel.yaml }}\n"
        ),
    )
}

#[test]
fn run_streams_progress_and_prints_summary() {
    let dir = TempDir::new().expect("tempdir");
    let manifest = degraded_suite(dir.path());

    conductor_cmd()
        .arg("run")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(contains("[1/3] loading Core Utilities (core)"))
        .stdout(contains("fab failed: activation failed: no mount point"))
        .stdout(contains("suite: DEGRADED"))
        .stdout(contains("3 components | 2 loaded | 0 unconfirmed | 1 failed"))
        .stdout(contains(
            "teardown: 0 components shut down (0 failed), 2 resources released (0 failed)",
        ));
}

#[test]
fn run_json_emits_machine_readable_summary() {
    let dir = TempDir::new().expect("tempdir");
    let manifest = degraded_suite(dir.path());

    let output = conductor_cmd()
        .args(["run", "--json"])
        .arg(&manifest)
        .output()
        .expect("run conductor");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["classification"], "degraded");
    assert_eq!(json["loaded"], 2);
    assert_eq!(json["failed"], 1);
    let ids: Vec<&str> = json["components"]
        .as_array()
        .expect("components")
        .iter()
        .filter_map(|c| c["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["core", "panel", "fab"]);
}

#[test]
fn run_without_teardown_skips_release() {
    let dir = TempDir::new().expect("tempdir");
    let manifest = degraded_suite(dir.path());

    conductor_cmd()
        .args(["run", "--no-teardown"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(contains("teardown:").not());
}

#[test]
fn critical_failure_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "core.yaml", "fail: core exploded\n");
    write(dir.path(), "extra.yaml", "");
    let manifest = write(
        dir.path(),
        "manifest.yaml",
        &format!(
            "{SETTINGS}components:\n  - {{ id: core, name: Core, locator: core.yaml, critical: true }}\n  - {{ id: extra, name: Extra, locator: extra.yaml }}\n"
        ),
    );

    conductor_cmd()
        .arg("run")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(contains("CRITICAL FAILURE"))
        .stdout(contains("extra loaded"));
}

#[test]
fn duplicate_ids_are_a_configuration_error() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "a.yaml", "");
    let manifest = write(
        dir.path(),
        "manifest.yaml",
        "components:\n  - { id: a, name: A, locator: a.yaml }\n  - { id: a, name: Again, locator: a.yaml }\n",
    );

    conductor_cmd()
        .arg("run")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(contains("duplicate component id 'a'"))
        .stdout(contains("loading").not());

    conductor_cmd()
        .arg("validate")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(contains("duplicate component id 'a'"));
}

#[test]
fn missing_manifest_fails() {
    let dir = TempDir::new().expect("tempdir");

    conductor_cmd()
        .arg("validate")
        .arg(dir.path().join("nope.yaml"))
        .assert()
        .failure()
        .stderr(contains("manifest not found"));
}

#[test]
fn validate_lists_descriptors_and_timings() {
    let dir = TempDir::new().expect("tempdir");
    let manifest = degraded_suite(dir.path());

    conductor_cmd()
        .arg("validate")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(contains("valid"))
        .stdout(contains("(3 components)"))
        .stdout(contains("activation 30000 ms | readiness 200 ms (poll 5 ms) | settle 1 ms"))
        .stdout(contains("components/panel.yaml"));
}

#[test]
fn validate_json_echoes_manifest() {
    let dir = TempDir::new().expect("tempdir");
    let manifest = degraded_suite(dir.path());

    let output = conductor_cmd()
        .args(["validate", "--json"])
        .arg(&manifest)
        .output()
        .expect("run conductor");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["valid"], true);
    assert_eq!(json["timings"]["settle_delay_ms"], 1);
    assert_eq!(json["components"][0]["id"], "core");
    assert_eq!(json["components"][0]["critical"], true);
    assert_eq!(json["components"][1]["locator"], "components/fab.yaml");
}

#[test]
fn inspect_prints_directory_snapshot() {
    let dir = TempDir::new().expect("tempdir");
    let manifest = degraded_suite(dir.path());

    let output = conductor_cmd()
        .arg("inspect")
        .arg(&manifest)
        .output()
        .expect("run conductor");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["classification"], "degraded");
    assert_eq!(json["failed"][0], "fab");
    assert_eq!(json["directory"]["components"][0], "core");
    assert_eq!(json["directory"]["components"][1], "panel");
    assert_eq!(json["directory"]["utilities"][0], "theme");
    assert_eq!(json["tracked_resources"], 2);
}
