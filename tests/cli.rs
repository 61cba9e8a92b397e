use assert_cmd::prelude::*;
use predicates::str::contains;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn viewer(state_file: &Path) -> Command {
    let mut cmd = Command::cargo_bin("scene-viewer").expect("binary exists");
    cmd.arg("--summary-only").arg("--state-file").arg(state_file);
    cmd
}

#[test]
fn cli_prints_cube_scene_summary() {
    let dir = tempdir().expect("temp dir");
    viewer(&dir.path().join("state.json"))
        .assert()
        .success()
        .stdout(contains("Scene cube (0): 2 objects, subject Cube"))
        .stdout(contains(" - point light intensity=1.20 visible=true"))
        .stdout(contains("Rendered 1 frame(s) headless"))
        .stdout(contains(" - Cube (box) pos=(0.00, 0.50, 0.00) color=#f69f1f"))
        .stdout(contains(" - Plane (plane) pos=(0.00, 0.00, 0.00)"));
}

#[test]
fn cli_selects_sphere_scene() {
    let dir = tempdir().expect("temp dir");
    viewer(&dir.path().join("state.json"))
        .args(["--scene", "1", "--frames", "3"])
        .assert()
        .success()
        .stdout(contains("Scene sphere (1): 2 objects, subject Sphere"))
        .stdout(contains("Rendered 3 frame(s) headless"))
        .stdout(contains(" - Sphere (sphere) pos=(0.00, 0.50, 0.00) color=#0000ff"));
}

#[test]
fn cli_falls_back_on_invalid_scene() {
    let dir = tempdir().expect("temp dir");
    viewer(&dir.path().join("state.json"))
        .args(["--scene", "abc"])
        .assert()
        .success()
        .stdout(contains("Invalid scene index \"abc\"; showing cube (0)"))
        .stdout(contains("Scene cube (0)"));
}

#[test]
fn cli_persists_panel_edits_until_reset() {
    let dir = tempdir().expect("temp dir");
    let state_file = dir.path().join("state.json");

    viewer(&state_file)
        .args(["--set", "Subject/pos x=2", "--set", "Helpers/axes=on"])
        .assert()
        .success()
        .stdout(contains(" - Cube (box) pos=(2.00, 0.50, 0.00)"));
    assert!(state_file.exists());

    viewer(&state_file)
        .assert()
        .success()
        .stdout(contains(" - Cube (box) pos=(2.00, 0.50, 0.00)"))
        .stdout(contains(" - Helpers/axes = true"));

    viewer(&state_file)
        .arg("--reset-state")
        .assert()
        .success()
        .stdout(contains("Cleared saved panel state"))
        .stdout(contains(" - Cube (box) pos=(0.00, 0.50, 0.00)"))
        .stdout(contains(" - Helpers/axes = false"));
}

#[test]
fn cli_ignores_malformed_state_file() {
    let dir = tempdir().expect("temp dir");
    let state_file = dir.path().join("state.json");
    std::fs::write(&state_file, "{ not json").expect("write state");

    viewer(&state_file)
        .assert()
        .success()
        .stdout(contains(" - Cube (box) pos=(0.00, 0.50, 0.00)"));
}

#[test]
fn cli_rejects_unknown_control() {
    let dir = tempdir().expect("temp dir");
    viewer(&dir.path().join("state.json"))
        .args(["--set", "Subject/size=3"])
        .assert()
        .failure()
        .stderr(contains("unknown control `Subject/size`"));
}
