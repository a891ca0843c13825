//! End-to-end CLI tests against a temporary data root.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_catalog(root: &Path) {
    let catalog = serde_json::json!({
        "suppliers": [
            {
                "id": 1,
                "name": "Acme Metals",
                "metrics": {
                    "quality": 9.5,
                    "delivery_on_time_pct": 98.0,
                    "price_competitiveness": 9.0,
                    "service": 9.0
                }
            },
            {
                "id": 2,
                "name": "Budget Parts",
                "metrics": {
                    "quality": 2.0,
                    "delivery_on_time_pct": 60.0,
                    "price_competitiveness": 2.5,
                    "service": 2.0
                }
            },
            {
                "id": 3,
                "name": "Dormant Supply Co",
                "active": false,
                "metrics": {}
            }
        ]
    });
    fs::write(
        root.join("suppliers.json"),
        serde_json::to_string_pretty(&catalog).unwrap(),
    )
    .unwrap();
}

fn ranq(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ranq").unwrap();
    cmd.arg("--root")
        .arg(root)
        .arg("--quiet")
        .env_remove("RANQ_ROOT")
        .env_remove("RANQ_CONFIG");
    cmd
}

#[test]
fn rank_outputs_robot_json_and_skips_inactive() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    let output = ranq(dir.path()).arg("--robot").arg("rank").output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["ranked"], 2);
    let rankings = parsed["rankings"].as_array().unwrap();
    assert_eq!(rankings[0]["supplier_name"], "Acme Metals");
    assert_eq!(rankings[0]["rank"], 1);
    assert_eq!(rankings[0]["state_key"], "Q5_D5_P5_S5");
}

#[test]
fn rank_table_output_lists_suppliers() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    ranq(dir.path())
        .arg("rank")
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Metals"))
        .stdout(predicate::str::contains("Ranked 2 supplier(s)."));
}

#[test]
fn learned_state_survives_across_invocations() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    ranq(dir.path()).arg("rank").assert().success();

    // A fresh process rehydrates the registry and Q-table from SQLite.
    ranq(dir.path())
        .arg("states")
        .assert()
        .success()
        .stdout(predicate::str::contains("Q5_D5_P5_S5"))
        .stdout(predicate::str::contains("2 of 625 possible states observed."));

    ranq(dir.path())
        .arg("qtable")
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("Q5_D5_P5_S5"));
}

#[test]
fn train_reports_stats() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    let output = ranq(dir.path())
        .arg("--robot")
        .args(["train", "--iterations", "5"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["iterations"], 5);
    assert_eq!(stats["suppliers_trained"], 2);
    assert_eq!(stats["total_updates"], 10);
}

#[test]
fn best_action_accepts_canonical_keys() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    ranq(dir.path())
        .args(["best-action", "Q5_D4_P3_S2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Q5_D4_P3_S2 ->"));
}

#[test]
fn best_action_rejects_malformed_keys() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    ranq(dir.path())
        .args(["best-action", "Q9_D1_P1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Q9_D1_P1"));
}

#[test]
fn qtable_reset_requires_confirmation_flag() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    ranq(dir.path()).arg("rank").assert().success();

    ranq(dir.path())
        .args(["qtable", "reset"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    ranq(dir.path())
        .args(["qtable", "reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Q-table reset"));
}

#[test]
fn invalid_env_override_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    ranq(dir.path())
        .env("RANQ_LEARNING_RATE", "fast")
        .arg("rank")
        .assert()
        .failure()
        .stderr(predicate::str::contains("RANQ_LEARNING_RATE"));
}

#[test]
fn env_override_out_of_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    ranq(dir.path())
        .env("RANQ_EXPLORATION_RATE", "1.5")
        .arg("rank")
        .assert()
        .failure()
        .stderr(predicate::str::contains("exploration_rate"));
}

#[test]
fn policy_before_any_run_is_empty() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    ranq(dir.path())
        .arg("policy")
        .assert()
        .success()
        .stdout(predicate::str::contains("No states observed yet"));
}

#[test]
fn robot_errors_are_json_on_stdout() {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());

    let output = ranq(dir.path())
        .arg("--robot")
        .args(["best-action", "bogus"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["error"], true);
    assert!(parsed["message"].as_str().unwrap().contains("bogus"));
}
