use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn threadscan(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("threadscan").unwrap();
    cmd.current_dir(dir).env_remove("THREADSCAN_DB").env_remove("RUST_LOG");
    cmd
}

fn write_offline_config(dir: &TempDir) {
    // Port 9 (discard) is closed on test machines; requests fail fast.
    std::fs::write(
        dir.path().join("threadscan.toml"),
        r#"
database_path = "data/store.db"

[remote]
base_url = "http://127.0.0.1:9"
request_timeout_secs = 2
"#,
    )
    .unwrap();
}

#[test]
fn init_creates_database_and_config() {
    let dir = TempDir::new().unwrap();

    threadscan(dir.path())
        .args(["--db", "store.db", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized threadscan"));

    assert!(dir.path().join("store.db").exists());
    assert!(dir.path().join("threadscan.toml").exists());

    threadscan(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn status_without_database_creates_nothing() {
    let dir = TempDir::new().unwrap();

    threadscan(dir.path())
        .args(["--db", "data/store.db", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No database at"));

    assert!(!dir.path().join("data").exists());

    threadscan(dir.path())
        .args(["--db", "data/store.db", "-o", "json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::diff("null\n"));

    assert!(!dir.path().join("data").exists());
}

#[test]
fn status_on_empty_store() {
    let dir = TempDir::new().unwrap();

    threadscan(dir.path())
        .args(["--db", "store.db", "init"])
        .assert()
        .success();

    threadscan(dir.path())
        .args(["--db", "store.db", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Objects: 0"))
        .stdout(predicate::str::contains("No passes recorded yet."));
}

#[test]
fn status_json() {
    let dir = TempDir::new().unwrap();

    threadscan(dir.path())
        .args(["--db", "store.db", "init"])
        .assert()
        .success();

    let output = threadscan(dir.path())
        .args(["--db", "store.db", "-o", "json", "status"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["objects"], 0);
    assert_eq!(stats["words"], 0);
    assert!(stats["last_pass"].is_null());
}

#[test]
fn config_reflects_file() {
    let dir = TempDir::new().unwrap();
    write_offline_config(&dir);

    threadscan(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://127.0.0.1:9"))
        .stdout(predicate::str::contains("refresh_comment_counts = true"));
}

#[test]
fn ingest_failure_exits_non_zero_and_stores_nothing() {
    let dir = TempDir::new().unwrap();
    write_offline_config(&dir);

    threadscan(dir.path())
        .args(["ingest", "stocks", "--limit", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ingestion pass over 'stocks' failed"));

    threadscan(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Objects: 0"))
        .stdout(predicate::str::contains("Passes: 0"));
}
