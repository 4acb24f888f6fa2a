//! Manifest files + declarative component scripts, loaded from disk.

use std::fs;
use std::path::Path;

use conductor_core::ResourceKind;
use conductor_loader::{LoadOutcome, Suite, SuiteClassification, SuiteError};
use serde_json::{json, Value};
use tempfile::TempDir;

const SETTINGS: &str = "settings:\n  settle_delay_ms: 1\n  readiness_timeout_ms: 300\n  readiness_poll_ms: 5\n";

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write file");
}

#[tokio::test]
async fn loads_scripts_relative_to_the_manifest() {
    let dir = TempDir::new().expect("tempdir");
    write(
        dir.path(),
        "components/core.yaml",
        "name: Core Utilities\nversion: 3.1.0\nutilities:\n  api_base: https://example.invalid\n",
    );
    write(
        dir.path(),
        "components/notifications.yaml",
        "requires: [core]\nsubscribe: [\"settings:loaded\"]\ntimers:\n  - { label: poll, every_ms: 50 }\nemit:\n  - { event: \"notifications:ready\", data: { unread: 2 } }\n",
    );
    write(dir.path(), "components/settings.yaml", "register_delay_ms: 20\n");
    write(
        dir.path(),
        "manifest.yaml",
        &format!(
            "{SETTINGS}components:\n  - {{ id: core, name: Core, locator: components/core.yaml, critical: true }}\n  - {{ id: notifications, name: Notifications, locator: components/notifications.yaml }}\n  - {{ id: settings, name: Settings, locator: components/settings.yaml, critical: true }}\n"
        ),
    );

    let suite = Suite::from_manifest_file(&dir.path().join("manifest.yaml")).expect("suite");
    let result = suite.run().await;

    assert_eq!(result.classification(), SuiteClassification::Success);
    let outcomes: Vec<_> = result.successful.iter().map(|r| (r.id(), r.outcome)).collect();
    assert_eq!(
        outcomes,
        vec![
            ("core", LoadOutcome::Confirmed),
            ("notifications", LoadOutcome::Loaded),
            ("settings", LoadOutcome::Confirmed),
        ]
    );

    let directory = suite.directory();
    let core = directory.entry("core").expect("core registered");
    assert_eq!(core.metadata.version, "3.1.0");
    let api_base = directory.get_utility("api_base").expect("utility");
    assert_eq!(api_base.call(&Value::Null), json!("https://example.invalid"));

    let counts = suite.tracker().counts_by_kind();
    assert_eq!(counts.get(&ResourceKind::Subscription), Some(&1));
    // The poll timer and the pending settings registration.
    assert_eq!(counts.get(&ResourceKind::Timer), Some(&2));

    let report = suite.teardown();
    assert_eq!(report.resources.released, 3);
    assert!(directory.is_empty());
    assert_eq!(directory.emit("settings:loaded", &Value::Null), 0);
}

#[tokio::test]
async fn malformed_script_fails_only_that_component() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "good.yaml", "");
    write(dir.path(), "bad.yaml", "elements: {not: a list}\n");
    write(
        dir.path(),
        "manifest.yaml",
        &format!(
            "{SETTINGS}components:\n  - {{ id: bad, name: Bad, locator: bad.yaml }}\n  - {{ id: good, name: Good, locator: good.yaml }}\n  - {{ id: gone, name: Gone, locator: missing.yaml }}\n"
        ),
    );

    let suite = Suite::from_manifest_file(&dir.path().join("manifest.yaml")).expect("suite");
    let result = suite.run().await;

    assert_eq!(result.classification(), SuiteClassification::Degraded);
    let failed: Vec<_> = result.failed.iter().map(|r| r.id()).collect();
    assert_eq!(failed, vec!["bad", "gone"]);
    assert!(result.failed[0]
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("malformed component script")));
    assert!(result.failed[1]
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("missing.yaml")));
    assert!(suite.directory().has("good"));
}

#[test]
fn empty_locator_is_rejected_up_front() {
    let dir = TempDir::new().expect("tempdir");
    write(
        dir.path(),
        "manifest.yaml",
        "components:\n  - { id: core, name: Core, locator: \"  \" }\n",
    );

    let err = Suite::from_manifest_file(&dir.path().join("manifest.yaml")).unwrap_err();
    assert!(matches!(err, SuiteError::Manifest(_)));
    assert!(err.to_string().contains("empty retrieval locator"));
}

#[test]
fn run_blocking_drives_a_fresh_runtime() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "only.yaml", "elements: [root]\n");
    write(
        dir.path(),
        "manifest.yaml",
        &format!("{SETTINGS}components:\n  - {{ id: only, name: Only, locator: only.yaml }}\n"),
    );

    let (result, teardown) =
        conductor_loader::run_blocking(&dir.path().join("manifest.yaml"), vec![])
            .expect("run blocking");

    assert_eq!(result.successful.len(), 1);
    assert_eq!(teardown.resources.released, 1);
}
