use assert_cmd::Command;
use chrono::{TimeZone, Utc};
use libfactcast::clock::FixedClock;
use libfactcast::{FactStatus, FactStore};
use predicates::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a config and a store holding three facts a day apart
async fn create_test_store() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("tweets");
    let config_path = temp_dir.path().join("config.toml");

    std::fs::write(
        &config_path,
        format!(
            "[store]\npath = \"{}\"\n",
            store_path.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();

    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 1, 30, 9, 0, 0).unwrap(),
    ));
    let store = FactStore::with_clock(&store_path, clock.clone());

    let first = store.append("Honey never spoils.").await.unwrap();
    store.mark(&first, FactStatus::Notified).await.unwrap();

    clock.advance(chrono::Duration::days(1));
    let second = store.append("Bananas are berries.").await.unwrap();
    store.mark(&second, FactStatus::Published).await.unwrap();

    clock.advance(chrono::Duration::days(1));
    store.append("Octopuses have three hearts.").await.unwrap();

    (temp_dir, config_path)
}

fn fact_history(config_path: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("fact-history").unwrap();
    cmd.env_remove("FACTCAST_CONFIG").arg("--config").arg(config_path);
    cmd
}

#[tokio::test]
async fn test_default_lists_all_in_order() {
    let (_temp_dir, config_path) = create_test_store().await;

    let output = fact_history(&config_path).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "30/01/24 09:00:00 | notified | Honey never spoils.",
            "31/01/24 09:00:00 | published | Bananas are berries.",
            "01/02/24 09:00:00 | stored | Octopuses have three hearts.",
        ]
    );
}

#[tokio::test]
async fn test_list_limit_keeps_most_recent() {
    let (_temp_dir, config_path) = create_test_store().await;

    let output = fact_history(&config_path)
        .args(["list", "--limit", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 2);
    assert!(!stdout.contains("Honey"));
    assert!(stdout.lines().last().unwrap().contains("Octopuses"));
}

#[tokio::test]
async fn test_list_json_output() {
    let (_temp_dir, config_path) = create_test_store().await;

    let output = fact_history(&config_path)
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let facts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let facts = facts.as_array().unwrap();
    assert_eq!(facts.len(), 3);
    assert_eq!(facts[0]["body"], "Honey never spoils.");
    assert_eq!(facts[0]["key"], "30/01/24 09:00:00");
    assert_eq!(facts[2]["status"], "stored");
}

#[tokio::test]
async fn test_get_by_key() {
    let (_temp_dir, config_path) = create_test_store().await;

    fact_history(&config_path)
        .args(["get", "31/01/24 09:00:00"])
        .assert()
        .success()
        .stdout("Bananas are berries.\n");
}

#[tokio::test]
async fn test_get_unknown_key_fails() {
    let (_temp_dir, config_path) = create_test_store().await;

    fact_history(&config_path)
        .args(["get", "01/01/99 00:00:00"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No fact stored under key"));
}

#[tokio::test]
async fn test_pending_lists_unfinished_runs() {
    let (_temp_dir, config_path) = create_test_store().await;

    let output = fact_history(&config_path).arg("pending").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("Honey"));
    assert!(stdout.contains("Bananas are berries."));
    assert!(stdout.contains("Octopuses have three hearts."));
}

#[tokio::test]
async fn test_clear_then_list_is_empty() {
    let (_temp_dir, config_path) = create_test_store().await;

    fact_history(&config_path)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 3 fact(s)"));

    fact_history(&config_path).assert().success().stdout("");

    // Clearing an empty store is fine
    fact_history(&config_path)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 0 fact(s)"));
}

#[test]
fn test_invalid_config_exit_code_2() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[store]\npath = \"\"\n").unwrap();

    fact_history(&config_path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("store.path"));
}

#[test]
fn test_invalid_format_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    fact_history(&config_path)
        .args(["list", "--format", "xml"])
        .assert()
        .failure();
}
