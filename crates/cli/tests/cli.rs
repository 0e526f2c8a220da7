use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn config_dir(extra: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bloodbridge.toml");
    std::fs::write(&path, extra).unwrap();
    (dir, path)
}

#[allow(deprecated)]
fn bloodbridge(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bloodbridge").expect("binary");
    cmd.env_remove("BLOODBRIDGE_TOKEN")
        .env_remove("BLOODBRIDGE_TOKEN_FILE")
        .env_remove("BLOODBRIDGE_API_URL")
        .arg("--quiet")
        .arg("--config")
        .arg(config);
    cmd
}

fn run(cmd: &mut Command) -> (bool, Value) {
    let output = cmd.output().expect("command run");
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    (output.status.success(), body)
}

#[test]
fn states_lists_every_state() {
    let (_dir, config) = config_dir("");
    let (ok, body) = run(bloodbridge(&config).arg("states"));

    assert!(ok);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data"]["count"], 36);
    let states = body["data"]["states"].as_array().unwrap();
    assert!(states.iter().any(|s| s["name"] == "Kerala"));
    assert!(body["meta"]["config_path"].as_str().is_some());
}

#[test]
fn districts_accepts_alternate_state_names() {
    let (_dir, config) = config_dir("");
    let (ok, body) = run(bloodbridge(&config).args(["districts", "Orissa"]));

    assert!(ok);
    assert_eq!(body["data"]["state"], "Odisha");
    assert_eq!(body["data"]["state_match"]["kind"], "alias");
    assert!(body["data"]["districts"].as_array().unwrap().len() > 20);
}

#[test]
fn districts_query_ranks_suggestions() {
    let (_dir, config) = config_dir("");
    let (ok, body) = run(bloodbridge(&config).args([
        "districts", "Kerala", "--query", "erna", "--limit", "3",
    ]));

    assert!(ok);
    let districts = body["data"]["districts"].as_array().unwrap();
    assert!(districts.len() <= 3);
    assert_eq!(districts[0]["district"], "Ernakulam");
}

#[test]
fn unknown_state_is_a_validation_error() {
    let (_dir, config) = config_dir("");
    let (ok, body) = run(bloodbridge(&config).args(["districts", "Atlantis"]));

    assert!(!ok);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "validation");
}

#[test]
fn match_strips_district_suffix() {
    let (_dir, config) = config_dir("");
    let (ok, body) = run(bloodbridge(&config).args([
        "match",
        "--state",
        "Kerala",
        "--district",
        "Ernakulam District",
        "--city",
        "Kochi",
    ]));

    assert!(ok);
    assert_eq!(body["data"]["match"]["state"]["value"], "Kerala");
    assert_eq!(body["data"]["match"]["district"]["value"], "Ernakulam");
    assert_eq!(body["data"]["complete"], true);
}

#[test]
fn match_uses_city_alias() {
    let (_dir, config) = config_dir("");
    let (ok, body) = run(bloodbridge(&config).args([
        "match",
        "--state",
        "Maharashtra",
        "--city",
        "Mumbai",
    ]));

    assert!(ok);
    assert_eq!(body["data"]["match"]["district"]["kind"], "alias");
    assert_eq!(body["data"]["match"]["district"]["value"], "Mumbai City");
}

#[test]
fn validate_reports_field_errors() {
    let (_dir, config) = config_dir("");
    let (ok, body) = run(bloodbridge(&config).args([
        "validate",
        "--phone",
        "12345abcde",
        "--blood-group",
        "AB+",
        "--state",
        "Kerala",
        "--district",
        "Pune",
        "--city",
        "Kochi",
    ]));

    assert!(!ok);
    assert_eq!(body["error"]["code"], "validation");
    let details = &body["error"]["details"];
    assert_eq!(details["phone"], "Phone number must be exactly 10 digits");
    assert_eq!(details["district"], "'Pune' is not a district of Kerala");
    assert!(details.get("blood_type").is_none());
}

#[test]
fn validate_rejects_padded_phone() {
    let (_dir, config) = config_dir("");
    let (ok, body) = run(bloodbridge(&config).args(["validate", "--phone", " 1234567890 "]));

    assert!(!ok);
    assert_eq!(
        body["error"]["details"]["phone"],
        "Phone number must be exactly 10 digits"
    );
}

#[test]
fn validate_accepts_good_fields() {
    let (_dir, config) = config_dir("");
    let (ok, body) = run(bloodbridge(&config).args([
        "validate",
        "--phone",
        "1234567890",
        "--gender",
        "female",
        "--dob",
        "1990-01-31",
    ]));

    assert!(ok);
    assert_eq!(body["data"]["valid"], true);
}

#[test]
fn invalid_config_is_reported_as_json() {
    let (_dir, config) = config_dir("[api]\nbase_url = \"localhost\"\n");
    bloodbridge(&config)
        .arg("states")
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": \"error\""))
        .stdout(predicate::str::contains("base_url must be an http(s) URL"));
}

#[test]
fn profile_without_token_is_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token");
    let (_cfg_dir, config) = config_dir(&format!(
        "[session]\ntoken_file = {:?}\n",
        token_file.display().to_string()
    ));
    let (ok, body) = run(bloodbridge(&config).arg("profile"));

    assert!(!ok);
    assert_eq!(body["error"]["code"], "no_session");
}
