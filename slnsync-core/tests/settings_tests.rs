//! Settings error-message, atomic-write-safety, and init integration tests.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use slnsync_core::{settings, CoreError, Settings};
use std::fs;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    fs::write(
        settings::settings_path_at(dir.path()),
        b": : corrupt : yaml : !!!\n  - broken: [unclosed",
    )
    .expect("write");

    let err = settings::load_at(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("slnsync.yaml"), "must contain file path, got: {err}");
}

#[test]
fn load_wrong_type_yaml_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    fs::write(settings::settings_path_at(dir.path()), b"- a list, not a mapping\n").expect("write");

    let err = settings::load_at(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
}

#[test]
fn empty_file_yields_defaults() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("slnsync.yaml").write_str("\n").expect("write");
    assert_eq!(settings::load_at(dir.path()).unwrap(), Settings::default());
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn save_cleans_up_tmp_file() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    settings::save_at(dir.path(), &Settings::default()).expect("save");

    dir.child("slnsync.yaml").assert(predicate::path::exists());
    dir.child("slnsync.yaml.tmp").assert(predicate::path::missing());
}

// ---------------------------------------------------------------------------
// 3. Init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_defaults_once() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let first = settings::init_at(dir.path()).expect("init");
    assert_eq!(first, Settings::default());

    dir.child("slnsync.yaml")
        .assert(predicate::str::contains("generate_sdk_style_projects: true"));
}

#[test]
fn init_is_idempotent_and_keeps_user_edits() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("slnsync.yaml")
        .write_str("enable_marker_directive: true\n")
        .expect("write");

    let loaded = settings::init_at(dir.path()).expect("init");
    assert!(loaded.enable_marker_directive);
    dir.child("slnsync.yaml")
        .assert(predicate::str::diff("enable_marker_directive: true\n"));
}
