//! E2E CLI tests: each test runs `rnet` as a subprocess in an isolated temp
//! directory, against small networks written there.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

const DIAMOND: &str = "# parent child\nR A\nR B\nA H\nB H\nH L\n";

/// Build a Command targeting the rnet binary, rooted in `dir`.
fn rnet_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rnet"));
    cmd.current_dir(dir);
    cmd.env("RETICULATE_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join("user-config"));
    cmd.env_remove("FORMAT");
    cmd.env_remove("RETICULATE_TIMING");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("write fixture");
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("rnet should not crash");
    assert!(
        output.status.success(),
        "rnet failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_accepts_a_rooted_dag() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);

    rnet_cmd(dir.path())
        .args(["check", "net.txt", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ok root=R nodes=5 edges=5"));
}

#[test]
fn check_rejects_a_cycle_with_stable_code() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "cyclic.txt", "R A\nA B\nB A\n");

    rnet_cmd(dir.path())
        .args(["check", "cyclic.txt", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2003]"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn check_reports_json_errors() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "forest.txt", "R1 A\nR2 A\n");

    let output = rnet_cmd(dir.path())
        .args(["check", "forest.txt", "--json"])
        .output()
        .expect("rnet should not crash");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("stderr should be JSON");
    assert_eq!(json["error"]["error_code"], "E2002");
}

#[test]
fn malformed_edge_list_is_an_invalid_document() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "bad.txt", "R A\nR A B\n");

    rnet_cmd(dir.path())
        .args(["check", "bad.txt", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E3001]"))
        .stderr(predicate::str::contains("bad.txt"));
}

#[test]
fn missing_file_fails_without_a_code() {
    let dir = TempDir::new().expect("tempdir");

    rnet_cmd(dir.path())
        .args(["check", "nope.txt", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: Failed to read nope.txt"));
}

// ---------------------------------------------------------------------------
// lsa
// ---------------------------------------------------------------------------

#[test]
fn lsa_text_lists_reticulations() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);

    rnet_cmd(dir.path())
        .args(["lsa", "net.txt", "--no-tree", "--format", "text"])
        .assert()
        .success()
        .stdout("lsa H R\n");
}

#[test]
fn lsa_json_includes_the_tree() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);

    let json = json_stdout(rnet_cmd(dir.path()).args(["lsa", "net.txt", "--format", "json"]));
    assert_eq!(json["root"], "R");
    assert_eq!(json["reticulations"][0]["reticulation"], "H");
    assert_eq!(json["reticulations"][0]["lsa"], "R");

    let tree = json["tree"].as_array().expect("tree rows");
    assert_eq!(tree.len(), 5);
    let h = tree
        .iter()
        .find(|row| row["node"] == "H")
        .expect("H in the tree");
    assert_eq!(h["parent"], "R");
    assert_eq!(h["depth"], 1);
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

#[test]
fn normalize_collapses_onto_root_and_leaves() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);

    let json = json_stdout(rnet_cmd(dir.path()).args(["normalize", "net.txt", "--json"]));
    assert_eq!(json["report"]["before"]["node_count"], 5);
    assert_eq!(json["report"]["after"]["node_count"], 2);
    assert_eq!(json["report"]["after"]["edge_count"], 1);
    assert_eq!(
        json["report"]["lost_labels"],
        serde_json::json!(["A", "B", "H"])
    );
    assert_eq!(json["network"]["edges"], serde_json::json!([["R", "L"]]));
}

#[test]
fn normalize_writes_output_file() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);

    let json = json_stdout(rnet_cmd(dir.path()).args([
        "normalize",
        "net.txt",
        "-o",
        "reduced.json",
        "--format",
        "json",
    ]));
    assert_eq!(json["written_to"], "reduced.json");
    assert!(json.get("network").is_none());

    let written = std::fs::read_to_string(dir.path().join("reduced.json")).expect("output file");
    let doc: Value = serde_json::from_str(&written).expect("written JSON");
    assert_eq!(doc["nodes"].as_array().map(Vec::len), Some(2));

    // The written file is itself a valid input.
    rnet_cmd(dir.path())
        .args(["check", "reduced.json", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ok root=R nodes=2 edges=1"));
}

#[test]
fn normalize_keep_retains_a_node() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);

    let json = json_stdout(rnet_cmd(dir.path()).args([
        "normalize",
        "net.txt",
        "--keep",
        "H",
        "--no-suppress",
        "--json",
    ]));
    assert_eq!(json["report"]["after"]["node_count"], 3);
    assert_eq!(
        json["network"]["edges"],
        serde_json::json!([["R", "H"], ["H", "L"]])
    );
}

#[test]
fn normalize_unknown_keep_label_fails() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);

    rnet_cmd(dir.path())
        .args(["normalize", "net.txt", "--keep", "Z", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No node is labelled \"Z\""));
}

#[test]
fn project_config_drives_normalization() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);
    write(
        dir.path(),
        "reticulate.toml",
        "[essential]\nkeep_labelled = true\n\n[normalize]\nkeep_labelled_pass_through = true\n",
    );

    let json = json_stdout(rnet_cmd(dir.path()).args(["normalize", "net.txt", "--json"]));
    assert_eq!(json["report"]["after"]["node_count"], 5);
    assert_eq!(json["report"]["after"]["edge_count"], 5);
    assert_eq!(json["report"]["lost_labels"], serde_json::json!([]));
}

#[test]
fn broken_config_reports_config_code() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);
    write(dir.path(), "reticulate.toml", "[normalize\n");

    rnet_cmd(dir.path())
        .args(["stats", "net.txt", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1002]"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);

    rnet_cmd(dir.path())
        .args(["--config", "missing.toml", "stats", "net.txt", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

#[test]
fn stats_json_summarizes_the_network() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);

    let json = json_stdout(rnet_cmd(dir.path()).args(["stats", "net.txt", "--json"]));
    assert_eq!(json["node_count"], 5);
    assert_eq!(json["reticulation_count"], 1);
    assert_eq!(json["leaf_count"], 1);
    assert_eq!(json["is_dag"], true);
    assert_eq!(json["is_tree"], false);
    assert!(
        json["content_hash"]
            .as_str()
            .is_some_and(|hash| hash.starts_with("blake3:"))
    );
}

#[test]
fn stats_tolerates_cycles() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "cyclic.txt", "R A\nA B\nB A\n");

    let json = json_stdout(rnet_cmd(dir.path()).args(["stats", "cyclic.txt", "--json"]));
    assert_eq!(json["is_dag"], false);
    assert_eq!(json["root_count"], 1);
}

#[test]
fn timing_report_goes_to_stderr() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "net.txt", DIAMOND);

    rnet_cmd(dir.path())
        .args(["--timing", "normalize", "net.txt", "--format", "text"])
        .assert()
        .success()
        .stderr(predicate::str::contains("timing report:"))
        .stderr(predicate::str::contains("cmd.normalize"))
        .stderr(predicate::str::contains("normalize.closure"));
}
