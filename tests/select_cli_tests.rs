//! End-to-end tests for the select subcommand and its grouping-tool contract

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const LOW: &str = "E1,E2,E3\n0,1,5\n1,0,5\n1,1,5\n";
const HIGH: &str = "E1,E2,E3\n8,9,5\n9,8,5\n9,9,5\n";

fn cotejar() -> Command {
    Command::cargo_bin("cotejar").unwrap()
}

fn write_pair(root: &Path, a: &str, b: &str, matrix: &str) {
    let dir = root.join("L3-SMT").join(format!("{a}_vs_{b}"));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("completed"), "").unwrap();
    fs::write(dir.join("matrix_X_uncore_shared.csv"), matrix).unwrap();
}

fn campaign() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(
        root.join("runtimes.csv"),
        "A, B, config, normalized_runtime\n\
         b, c, L3-SMT, 1.0\n\
         c, b, L3-SMT, 1.3\n\
         a, b, L3-SMT, 1.0\n\
         a, c, L3-SMT, 1.3\n",
    )
    .unwrap();
    write_pair(root, "b", "c", LOW);
    write_pair(root, "c", "b", HIGH);
    write_pair(root, "a", "b", LOW);
    write_pair(root, "a", "c", HIGH);
    dir
}

#[cfg(unix)]
fn fake_tool(dir: &Path, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("fake-grouper");
    fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn test_select_restricts_to_grouped_events() {
    let dir = campaign();
    let tool = fake_tool(dir.path(), "printf 'E1\\nE2\\n'");
    let ranking = dir.path().join("ranking.csv");
    fs::write(&ranking, "E1,0.9\nE2,0.8\nE3,0.1\n").unwrap();

    cotejar()
        .args([
            "select",
            "--data",
            dir.path().to_str().unwrap(),
            "--tool",
            tool.to_str().unwrap(),
            "--ranking",
            ranking.to_str().unwrap(),
            "--config",
            "L3-SMT",
            "--tests",
            "a",
        ])
        .assert()
        .success();

    let results = fs::read_to_string(dir.path().join("svm_machine_aware.csv")).unwrap();
    let lines: Vec<&str> = results.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("L3-SMT,a,6,6"));
}

#[cfg(unix)]
#[test]
fn test_select_max_features_caps_the_selection() {
    let dir = campaign();
    let tool = fake_tool(dir.path(), "printf 'E1\\nE2\\nE3\\n'");
    let ranking = dir.path().join("ranking.csv");
    fs::write(&ranking, "").unwrap();

    cotejar()
        .args([
            "select",
            "--data",
            dir.path().to_str().unwrap(),
            "--tool",
            tool.to_str().unwrap(),
            "--ranking",
            ranking.to_str().unwrap(),
            "--config",
            "L3-SMT",
            "--tests",
            "a",
            "--max-features",
            "1",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 selected event"));
}

#[cfg(unix)]
#[test]
fn test_select_skips_applications_without_default_ranking() {
    let dir = campaign();
    let tool = fake_tool(dir.path(), "printf 'E1\\n'");
    // Only application a has a ranking file under the data root.
    fs::write(dir.path().join("topk_svm_a_L3-SMT.csv"), "E1,0.9\n").unwrap();

    cotejar()
        .args([
            "select",
            "--data",
            dir.path().to_str().unwrap(),
            "--tool",
            tool.to_str().unwrap(),
            "--config",
            "L3-SMT",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping b"));

    let results = fs::read_to_string(dir.path().join("svm_machine_aware.csv")).unwrap();
    assert_eq!(results.lines().count(), 2); // header + a only
}

#[cfg(unix)]
#[test]
fn test_select_tool_failure_is_fatal() {
    let dir = campaign();
    let tool = fake_tool(dir.path(), "exit 1");
    let ranking = dir.path().join("ranking.csv");
    fs::write(&ranking, "").unwrap();

    cotejar()
        .args([
            "select",
            "--data",
            dir.path().to_str().unwrap(),
            "--tool",
            tool.to_str().unwrap(),
            "--ranking",
            ranking.to_str().unwrap(),
            "--config",
            "L3-SMT",
            "--tests",
            "a",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("feature grouping tool failed"));
}

#[cfg(unix)]
#[test]
fn test_select_unknown_event_from_tool_is_fatal() {
    let dir = campaign();
    let tool = fake_tool(dir.path(), "printf 'NOT_AN_EVENT\\n'");
    let ranking = dir.path().join("ranking.csv");
    fs::write(&ranking, "").unwrap();

    cotejar()
        .args([
            "select",
            "--data",
            dir.path().to_str().unwrap(),
            "--tool",
            tool.to_str().unwrap(),
            "--ranking",
            ranking.to_str().unwrap(),
            "--config",
            "L3-SMT",
            "--tests",
            "a",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOT_AN_EVENT"));
}
