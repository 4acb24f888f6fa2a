//! Manifest file loading: error messages and fail-fast validation.

use assert_fs::prelude::*;
use conductor_core::{manifest, ManifestError};
use predicates::prelude::predicate;
use rstest::rstest;

const VALID: &str = "\
settings:
  readiness_timeout_ms: 2500
components:
  - id: core
    name: Core Utilities
    locator: components/core.yaml
    critical: true
  - id: notifications
    name: Notification Center
    locator: components/notifications.yaml
";

// ---------------------------------------------------------------------------
// 1. Happy path
// ---------------------------------------------------------------------------

#[test]
fn loads_descriptors_in_file_order() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("suite.yaml");
    file.write_str(VALID).expect("write");
    file.assert(predicate::path::is_file());

    let loaded = manifest::load_at(file.path()).expect("load");
    let ids: Vec<&str> = loaded.manifest.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["core", "notifications"]);
    assert!(loaded.manifest.descriptors()[0].critical);
    assert!(!loaded.manifest.descriptors()[1].critical);
    assert_eq!(loaded.settings.readiness_timeout_ms, Some(2500));
}

#[test]
fn settings_block_is_optional() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("suite.yaml");
    file.write_str("components:\n  - id: a\n    name: A\n    locator: a.yaml\n")
        .expect("write");

    let loaded = manifest::load_at(file.path()).expect("load");
    assert_eq!(loaded.settings, Default::default());
}

// ---------------------------------------------------------------------------
// 2. Configuration errors
// ---------------------------------------------------------------------------

#[rstest]
#[case::duplicate_id(
    "components:\n  - {id: a, name: A, locator: a.yaml}\n  - {id: a, name: A2, locator: b.yaml}\n",
    "duplicate component id 'a'"
)]
#[case::empty_locator(
    "components:\n  - {id: a, name: A, locator: ''}\n",
    "empty retrieval locator"
)]
#[case::empty_id(
    "components:\n  - {id: '', name: A, locator: a.yaml}\n",
    "empty id"
)]
fn invalid_manifest_is_rejected(#[case] yaml: &str, #[case] expected: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("suite.yaml");
    file.write_str(yaml).expect("write");

    let err = manifest::load_at(file.path()).unwrap_err();
    assert!(err.to_string().contains(expected), "got: {err}");
}

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("suite.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = manifest::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("suite.yaml"));
}

#[test]
fn unknown_setting_is_a_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("suite.yaml");
    file.write_str("settings:\n  settle_delay: 5\ncomponents: []\n")
        .expect("write");

    let err = manifest::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }), "got: {err}");
}

#[test]
fn missing_manifest_names_the_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let err = manifest::load_at(&dir.path().join("nope.yaml")).unwrap_err();
    assert!(err.to_string().contains("manifest not found"));
    assert!(err.to_string().contains("nope.yaml"));
}
