// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hv_core::Run;
use serde_json::json;
use tempfile::tempdir;

#[test]
fn save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("snapshot.json");
    let mut state = StoreState::default();
    let run = Run::builder().build();
    state.put_run(&run);

    Snapshot::new(state).save(&path).unwrap();
    let loaded = Snapshot::load(&path).unwrap().unwrap();

    assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
    assert_eq!(loaded.state.get_run(&run.id), Some(run));
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn missing_file_loads_as_none() {
    let dir = tempdir().unwrap();
    assert!(Snapshot::load(&dir.path().join("nope.json")).unwrap().is_none());
}

#[yare::parameterized(
    newer   = { json!({"v": 99, "state": {"runs": {}}, "created_at": "2026-01-01T00:00:00Z"}) },
    zero    = { json!({"v": 0, "state": {"runs": {}}, "created_at": "2026-01-01T00:00:00Z"}) },
)]
fn other_versions_fail_closed(body: serde_json::Value) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, body.to_string()).unwrap();

    assert!(matches!(
        Snapshot::load(&path),
        Err(StoreError::UnsupportedVersion { supported: CURRENT_SNAPSHOT_VERSION, .. })
    ));
}

#[test]
fn unversioned_snapshot_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, r#"{"state": {"runs": {}}}"#).unwrap();
    assert!(matches!(Snapshot::load(&path), Err(StoreError::MissingVersion)));
}

#[test]
fn rotate_bak_path_keeps_three() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    for generation in 1..=4 {
        let bak = rotate_bak_path(&path);
        std::fs::write(&bak, format!("{generation}")).unwrap();
    }

    let read = |ext: &str| std::fs::read_to_string(path.with_extension(ext)).unwrap();
    assert_eq!(read("bak"), "4");
    assert_eq!(read("bak.2"), "3");
    assert_eq!(read("bak.3"), "2");
    assert!(!path.with_extension("bak.4").exists());
}
