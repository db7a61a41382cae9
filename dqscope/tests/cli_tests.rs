//! Integration tests for the dqscope command line.
//!
//! Inputs are written to temporary directories; commands run both through
//! the library entry point and through the compiled binary.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};
use std::process::Command as Process;

use dqscope::{CheckArgs, Command, ProfileArgs, SuggestArgs, ValidateRulesArgs, execute};
use serde_json::{Value, json};
use tempfile::TempDir;

fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, value.to_string()).expect("write fixture");
    path
}

fn orders() -> Value {
    let rows: Vec<Value> = (0..24)
        .map(|i| {
            json!({
                "id": if i == 23 { "0".to_string() } else { i.to_string() },
                "status": if i % 6 == 0 { "" } else if i % 2 == 0 { "open" } else { "closed" },
                "amount": if i == 5 { "5000".to_string() } else { format!("{}", 10 + i) },
            })
        })
        .collect();
    Value::Array(rows)
}

fn rules() -> Value {
    json!({
        "format_version": "1.0",
        "rules": [
            {"column": "id", "conditionType": "unique"},
            {"column": "status", "conditionType": "notEmpty"},
            {"column": "amount", "dataType": "numeric", "conditionType": "lessThan", "params": {"value": 1000}}
        ]
    })
}

fn parse(output: &str) -> Value {
    serde_json::from_str(output).expect("command output is JSON")
}

fn binary() -> Process {
    Process::new(env!("CARGO_BIN_EXE_dqscope"))
}

fn fixtures() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let data = write_json(&dir, "orders.json", &orders());
    let rules = write_json(&dir, "orders.rules.json", &rules());
    (dir, data, rules)
}

fn check_command(data: &Path, rules: &Path) -> Command {
    Command::Check(CheckArgs {
        data: data.to_path_buf(),
        rules: rules.to_path_buf(),
        now: None,
    })
}

#[test]
fn test_integration_check_reports_failures() {
    let (_dir, data, rules) = fixtures();
    let report = parse(&execute(&check_command(&data, &rules)).unwrap());

    // Bad rows: 0 and 23 share an id; 0, 6, 12 and 18 lack a status; 5 is oversized
    assert_eq!(report["results"]["rowCount"], 24);
    assert_eq!(report["results"]["badRowCount"], 6);
    assert_eq!(report["results"]["rules"].as_array().unwrap().len(), 3);
    assert_eq!(report["summary"]["good_rows"], 18);
    assert_eq!(report["topColumns"][0][0], "status");
    assert!(report["skippedRules"].as_array().unwrap().is_empty());
}

#[test]
fn test_integration_check_rejects_unknown_column() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_json(&dir, "d.json", &orders());
    let rules = write_json(
        &dir,
        "r.json",
        &json!([{"column": "missing", "conditionType": "notEmpty"}]),
    );
    let err = execute(&check_command(&data, &rules)).unwrap_err();
    assert!(format!("{:#}", err).contains("missing"));
}

#[test]
fn test_integration_suggest_hides_dismissed() {
    let (_dir, data, rules) = fixtures();
    let args = |dismissed: Vec<String>| {
        Command::Suggest(SuggestArgs {
            data: data.clone(),
            rules: Some(rules.clone()),
            config: None,
            now: None,
            applied: Vec::new(),
            dismissed,
        })
    };

    let report = parse(&execute(&args(Vec::new())).unwrap());
    assert!(
        report["summary"]
            .as_str()
            .unwrap()
            .ends_with("Current bad rows: 6/24.")
    );
    let ids: Vec<String> = report["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&"outliers-amount".to_string()));
    // notEmpty on status is already active
    assert!(!ids.contains(&"missing-status".to_string()));

    let report = parse(&execute(&args(vec!["outliers-amount".to_string()])).unwrap());
    assert!(
        report["suggestions"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["id"] != "outliers-amount")
    );
}

#[test]
fn test_integration_suggest_rejects_invalid_config() {
    let (dir, data, _rules) = fixtures();
    let config = write_json(&dir, "config.json", &json!({"uniq_min_ratio": 4.0}));
    let err = execute(&Command::Suggest(SuggestArgs {
        data,
        rules: None,
        config: Some(config),
        now: None,
        applied: Vec::new(),
        dismissed: Vec::new(),
    }))
    .unwrap_err();
    assert!(format!("{:#}", err).contains("uniq_min_ratio"));
}

#[test]
fn test_integration_profile_single_column() {
    let (_dir, data, _rules) = fixtures();
    let report = parse(
        &execute(&Command::Profile(ProfileArgs {
            data: data.clone(),
            column: Some("status".to_string()),
            bins: None,
        }))
        .unwrap(),
    );
    assert_eq!(report["kind"], "categorical");
    assert_eq!(report["missing"], 4);

    let err = execute(&Command::Profile(ProfileArgs {
        data,
        column: Some("nope".to_string()),
        bins: None,
    }))
    .unwrap_err();
    assert!(err.to_string().contains("Unknown column: nope"));
}

#[test]
fn test_integration_validate_rules() {
    let (_dir, data, rules) = fixtures();
    let report = parse(
        &execute(&Command::ValidateRules(ValidateRulesArgs {
            rules,
            data: Some(data),
        }))
        .unwrap(),
    );
    assert_eq!(report["valid"], true);
    assert_eq!(report["ruleCount"], 3);
    assert_eq!(report["rules"][0], "[id] unique");
}

#[test]
fn test_integration_binary_writes_output_file() {
    let (dir, data, rules) = fixtures();
    let out = dir.path().join("report.json");
    let status = binary()
        .args(["--quiet", "check", "--data"])
        .arg(&data)
        .arg("--rules")
        .arg(&rules)
        .arg("--output")
        .arg(&out)
        .status()
        .expect("run dqscope");
    assert!(status.success());
    let report = parse(&std::fs::read_to_string(&out).unwrap());
    assert_eq!(report["results"]["badRowCount"], 6);
}

#[test]
fn test_integration_binary_fails_on_inert_rule() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write_json(
        &dir,
        "r.json",
        &json!([{"column": "amount", "conditionType": "range", "params": {"min": 1}}]),
    );
    let output = binary()
        .args(["--quiet", "validate-rules"])
        .arg(&rules)
        .output()
        .expect("run dqscope");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
