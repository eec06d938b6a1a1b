// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end runs of the `gn2bp` binary.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DESC: &str = r#"{
  "//app:app": {
    "type": "executable",
    "toolchain": "//build/toolchain/android:android_clang_arm64",
    "sources": ["//app/main.cc"],
    "deps": ["//app:core"],
    "cflags": ["-O2"]
  },
  "//app:core": {
    "type": "source_set",
    "toolchain": "//build/toolchain/android:android_clang_arm64",
    "sources": ["//app/core.cc"],
    "defines": ["CORE=1"]
  },
  "//app:broken": {
    "type": "executable",
    "deps": ["//app:missing"]
  }
}"#;

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("desc.json"), DESC).unwrap();
    dir
}

fn gn2bp(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gn2bp").unwrap();
    cmd.env("RUST_LOG", "warn").current_dir(dir);
    cmd
}

#[test]
fn resolve_prints_json_graph() {
    let dir = workspace();
    let output = gn2bp(dir.path())
        .args(["resolve", "--desc", "desc.json", "--config-dir", "cfg", "//app:app"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let app = &graph["targets"]["//app:app"];
    assert_eq!(app["type"], "executable");
    let defines = app["defines"].as_array().unwrap();
    assert!(defines.iter().any(|d| d == "CORE=1"));
    assert!(graph["targets"]["//app:core"].is_object());
}

#[test]
fn resolve_summary_has_one_line_per_target() {
    let dir = workspace();
    gn2bp(dir.path())
        .args([
            "resolve",
            "--desc",
            "desc.json",
            "--config-dir",
            "cfg",
            "--format",
            "summary",
            "//app:app",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("//app:app\texecutable\tarch=android_arm64"))
        .stdout(predicate::str::contains("//app:core\tsource_set"))
        .stdout(predicate::str::contains("java_sources\t0"));
}

#[test]
fn missing_dependency_fails_with_lookup_tag() {
    let dir = workspace();
    gn2bp(dir.path())
        .args(["resolve", "--desc", "desc.json", "--config-dir", "cfg", "//app:broken"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("[GN_LOOKUP_FAILURE]"))
        .stderr(predicate::str::contains("//app:missing"));
}

#[test]
fn desc_and_gn_out_conflict() {
    let dir = workspace();
    gn2bp(dir.path())
        .args(["resolve", "--desc", "desc.json", "--gn-out", "out", "//app:app"])
        .assert()
        .failure();
}

#[test]
fn failing_gn_binary_is_reported() {
    let dir = workspace();
    gn2bp(dir.path())
        .args([
            "resolve",
            "--gn-out",
            "out",
            "--gn",
            "./definitely-not-gn",
            "--config-dir",
            "cfg",
            "//app:app",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to spawn"));
}

#[test]
fn init_config_writes_defaults_once() {
    let dir = workspace();
    gn2bp(dir.path())
        .args(["init-config", "--config-dir", "cfg"])
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("cfg/resolver.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["third_party_prefix"], "//gn");

    gn2bp(dir.path())
        .args(["init-config", "--config-dir", "cfg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    gn2bp(dir.path())
        .args(["init-config", "--config-dir", "cfg", "--force"])
        .assert()
        .success();
}

#[test]
fn config_prefix_controls_third_party_leaves() {
    let dir = workspace();
    std::fs::create_dir(dir.path().join("cfg")).unwrap();
    std::fs::write(
        dir.path().join("cfg/resolver.json"),
        r#"{ "third_party_prefix": "//app:core" }"#,
    )
    .unwrap();

    let output = gn2bp(dir.path())
        .args(["resolve", "--desc", "desc.json", "--config-dir", "cfg", "//app:app"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(graph["targets"]["//app:core"]["is_third_party"], true);
}
