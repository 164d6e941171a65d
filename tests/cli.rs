//! End-to-end tests for the json-seeder binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;


fn seeder(work_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("json-seeder").unwrap();
    cmd.current_dir(work_dir)
        .env_remove("MONGO_URI")
        .env_remove("MONGO_DB")
        .env_remove("JSON_PATH")
        .env_remove("IMPORT_TIMEOUT_SECS");
    cmd
}


fn seed_dir() -> TempDir {
    let tmp_dir = TempDir::new().unwrap();
    fs::write(
        tmp_dir.path().join("customers.json"),
        r#"[{"name":"a"},{"name":"b"},{"name":"c"}]"#,
    )
    .unwrap();
    fs::write(tmp_dir.path().join("bad.orders.json"), "[{\"id\": 1}, {\"id\": ").unwrap();
    tmp_dir
}


#[test]
fn test_check_lists_collections_and_errors() {
    let tmp_dir = seed_dir();

    seeder(tmp_dir.path())
        .args(["check", "--path"])
        .arg(tmp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("customers.json -> customers (3 records)"))
        .stdout(predicate::str::contains("bad.orders.json -> orders"))
        .stdout(predicate::str::contains("1 of 2 file(s) ready to import"));
}


#[test]
fn test_check_json_report() {
    let tmp_dir = seed_dir();

    let output = seeder(tmp_dir.path())
        .args(["check", "--json", "--path"])
        .arg(tmp_dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = report.as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["collection"], "orders");
    assert!(files[0]["error"].is_string());
    assert_eq!(files[1]["collection"], "customers");
    assert_eq!(files[1]["records"], 3);
}


#[test]
fn test_check_reads_path_from_environment() {
    let tmp_dir = seed_dir();

    seeder(tmp_dir.path())
        .arg("check")
        .env("JSON_PATH", tmp_dir.path().join("customers.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 1 file(s) ready to import"));
}


#[test]
fn test_import_missing_path_is_fatal() {
    let tmp_dir = TempDir::new().unwrap();

    seeder(tmp_dir.path())
        .args(["import", "--uri", "mongodb://127.0.0.1:1", "--db", "seed", "--path"])
        .arg(tmp_dir.path().join("missing"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid JSON path"));
}


#[test]
fn test_import_bad_uri_is_fatal() {
    let tmp_dir = seed_dir();

    seeder(tmp_dir.path())
        .args(["import", "--uri", "not-a-mongo-uri", "--db", "seed", "--path"])
        .arg(tmp_dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Mongo connect error"));
}


#[test]
fn test_import_requires_uri() {
    let tmp_dir = seed_dir();

    seeder(tmp_dir.path())
        .args(["import", "--db", "seed", "--path"])
        .arg(tmp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--uri"));
}


#[test]
fn test_dotenv_supplies_settings() {
    let tmp_dir = seed_dir();
    fs::write(
        tmp_dir.path().join(".env"),
        format!("JSON_PATH={}\n", tmp_dir.path().join("customers.json").display()),
    )
    .unwrap();

    seeder(tmp_dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("customers.json -> customers (3 records)"));
}
