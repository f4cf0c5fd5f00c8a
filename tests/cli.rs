//! Command-line integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ledger(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ledger").unwrap();
    cmd.env("LEDGER_CLI_DATA_DIR", dir.path())
        .env_remove("LEDGER_STORAGE_ENGINE")
        .env_remove("LEDGER_ENCRYPTION")
        .env_remove("LEDGER_DB_PATH")
        .env_remove("LEDGER_JSON_PATH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn add_then_list() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .args(["add", "expense", "54.30", "food", "-m", "3", "-y", "2024", "-d", "weekly shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added expense transaction"));

    ledger(&dir)
        .args(["list", "--year", "2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03"))
        .stdout(predicate::str::contains("54.30"))
        .stdout(predicate::str::contains("1 transaction(s)"));
}

#[test]
fn profit_and_loss_report() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .args(["add", "income", "1000", "salary", "-m", "1", "-y", "2024"])
        .assert()
        .success();
    ledger(&dir)
        .args(["add", "expense", "250", "rent", "-m", "1", "-y", "2024"])
        .assert()
        .success();

    ledger(&dir)
        .args(["report", "pnl", "2024", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profit & Loss: 2024-01"))
        .stdout(predicate::str::contains("750.00"))
        .stdout(predicate::str::contains("75%"));
}

#[test]
fn rejects_category_outside_type() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .args(["add", "income", "10", "food", "-m", "1", "-y", "2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));
}

#[test]
fn delete_unknown_id_fails() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .args(["delete", "expense", "aB3dE5fG"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn sqlite_engine_via_config() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .args(["config", "--engine", "sqlite"])
        .assert()
        .success();
    ledger(&dir)
        .args(["add", "investment", "100", "stocks", "-m", "2", "-y", "2025"])
        .assert()
        .success();
    ledger(&dir)
        .args(["report", "periods"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025"));

    assert!(dir.path().join("data").join("ledger.db").exists());
}
