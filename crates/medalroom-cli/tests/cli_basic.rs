//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary data directory and
//! verify outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command with `home` as the data directory and return
/// (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_medalroom-cli"))
        .env("MEDALROOM_HOME", home)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn wallet_json(home: &Path) -> serde_json::Value {
    let out = run_cli_success(home, &["wallet", "--json"]);
    serde_json::from_str(&out).unwrap()
}

#[test]
fn test_settings_writes_default_config() {
    let home = tempfile::tempdir().unwrap();
    let out = run_cli_success(home.path(), &["settings"]);
    assert!(out.contains("valid"));
    assert!(home.path().join("config.toml").exists());

    let value = run_cli_success(home.path(), &["settings", "get", "always_rest_after"]);
    assert_eq!(value.trim(), "22:00");
}

#[test]
fn test_settings_set_rejects_invalid_time() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["settings", "set", "always_rest_after", "late"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));

    run_cli_success(home.path(), &["settings", "set", "always_rest_after", "20:30"]);
    let value = run_cli_success(home.path(), &["settings", "get", "always_rest_after"]);
    assert_eq!(value.trim(), "20:30");
}

#[test]
fn test_fix_rewards_updates_wallet_once() {
    let home = tempfile::tempdir().unwrap();
    // 2025-03-03 is a Monday, mapped to the default workday
    run_cli_success(home.path(), &["timer", "add", "150", "--date", "2025-03-03"]);
    run_cli_success(home.path(), &["timer", "add", "240", "--date", "2025-03-04"]);

    let out = run_cli_success(
        home.path(),
        &["fix-rewards", "--from", "2025-03-03", "--to", "2025-03-09"],
    );
    assert!(out.contains("2025-03-08 skipped"));

    let wallet = wallet_json(home.path());
    assert_eq!(wallet["totals"]["bronze"], 2);
    assert_eq!(wallet["totals"]["silver"], 1);
    assert_eq!(wallet["revision"], 1);

    let out = run_cli_success(home.path(), &["fix-rewards", "--date", "2025-03-03"]);
    assert!(out.contains("wallet unchanged"));
    assert_eq!(wallet_json(home.path())["revision"], 1);
}

#[test]
fn test_fix_rewards_json_output() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["timer", "add", "160", "--date", "2025-03-05"]);

    let out = run_cli_success(home.path(), &["fix-rewards", "--date", "2025-03-05", "--json"]);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["days"][0]["status"], "reconciled");
    assert_eq!(report["days"][0]["minutes"], 160);
    assert_eq!(report["wallet"]["adjustment"]["bronze"], 1);
}

#[test]
fn test_bad_date_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["fix-rewards", "--date", "03/03/2025"]);
    assert_ne!(code, 0);

    let (_, stderr, code) = run_cli(
        home.path(),
        &["fix-rewards", "--from", "2025-03-05", "--to", "2025-03-03"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid date range"));
}

#[test]
fn test_timer_list_and_delete() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["timer", "add", "25", "--name", "Reading", "--date", "2025-03-03"]);

    let out = run_cli_success(home.path(), &["timer", "list", "--json"]);
    let timers: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(timers[0]["name"], "Reading");
    let id = timers[0]["id"].as_i64().unwrap().to_string();

    run_cli_success(home.path(), &["timer", "delete", &id]);
    let (_, _, code) = run_cli(home.path(), &["timer", "delete", &id]);
    assert_eq!(code, 1);
}

#[test]
fn test_import_backup_file() {
    let home = tempfile::tempdir().unwrap();
    let backup = home.path().join("backup.json");
    std::fs::write(
        &backup,
        r#"{ "task": { "entities": { "t1": { "title": "Write", "timeSpentOnDay": { "2025-03-03": 9000000 } } } } }"#,
    )
    .unwrap();
    let file = backup.to_str().unwrap();

    let out = run_cli_success(home.path(), &["import", "--file", file, "--source", "spbackup"]);
    assert!(out.contains("Imported 1 timers (150 min)"));
    run_cli_success(home.path(), &["import", "--file", file]);

    run_cli_success(home.path(), &["fix-rewards", "--date", "2025-03-03"]);
    assert_eq!(wallet_json(home.path())["totals"]["bronze"], 1);
}

#[test]
fn test_import_latest_needs_dir() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["import", "--latest"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("import.dir"));
}

#[test]
fn test_import_watch_runs_then_quits() {
    let home = tempfile::tempdir().unwrap();
    let backups = home.path().join("backups");
    std::fs::create_dir(&backups).unwrap();
    std::fs::write(
        backups.join("backup.json"),
        r#"{ "task": { "entities": { "t1": { "title": "Write", "timeSpentOnDay": { "2025-03-03": 9000000 } } } } }"#,
    )
    .unwrap();
    run_cli_success(home.path(), &["settings", "set", "import.dir", backups.to_str().unwrap()]);
    run_cli_success(home.path(), &["settings", "set", "import.every", "1h"]);

    let mut child = Command::new(env!("CARGO_BIN_EXE_medalroom-cli"))
        .env("MEDALROOM_HOME", home.path())
        .env_remove("RUST_LOG")
        .args(["import", "--watch"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");
    child.stdin.take().unwrap().write_all(b"q\n").unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("every 1h"));
    assert!(stdout.contains("Imported 1 timers (150 min)"));
}

#[test]
fn test_import_watch_rejects_bad_interval() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["settings", "set", "import.every", "0s"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("import.every"));

    let (_, stderr, code) = run_cli(home.path(), &["import", "--watch"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("import.dir"));
}

#[test]
fn test_status_json() {
    let home = tempfile::tempdir().unwrap();
    let out = run_cli_success(home.path(), &["status", "--json", "--days", "3"]);
    let status: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(status["history"].as_array().unwrap().len(), 3);
    assert_eq!(status["level"]["level"], 1);
}

#[test]
fn test_status_days_out_of_range_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["status", "--days", "200000000"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("--days"));

    let (_, _, code) = run_cli(home.path(), &["status", "--days", "0"]);
    assert_ne!(code, 0);
}
