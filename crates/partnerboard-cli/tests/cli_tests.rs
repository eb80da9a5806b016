//! Integration tests for the `partnerboard` binary.
//!
//! Each test runs the CLI as a subprocess against its own redb file in a
//! temporary directory, so state carries over between invocations within a
//! test but never between tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::process::Command;

use partnerboard_storage::{RedbBackend, StorageBackend};
use serde_json::Value;

/// Helper: locate the `partnerboard` binary built by `cargo test`.
fn partnerboard_bin() -> &'static str {
    let path = env!("CARGO_BIN_EXE_partnerboard");
    assert!(Path::new(path).exists(), "partnerboard binary not found at {path}");
    path
}

/// Helper: run against `db` and return (`exit_code`, stdout, stderr).
fn run(db: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(partnerboard_bin())
        .args(args)
        .env("PARTNERBOARD_STORAGE", "redb")
        .env("PARTNERBOARD_STORAGE_PATH", db)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute partnerboard");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

fn run_json(db: &Path, args: &[&str]) -> Value {
    let mut args = args.to_vec();
    args.push("--json");
    let (code, stdout, stderr) = run(db, &args);
    assert_eq!(code, 0, "command {args:?} failed: {stderr}");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("bad JSON ({e}): {stdout}"))
}

fn temp_db() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("board.redb");
    (dir, db)
}

// ── Help ─────────────────────────────────────────────────────────────

#[test]
fn help_lists_both_panels() {
    let (_dir, db) = temp_db();
    let (code, stdout, _) = run(&db, &["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("ads"), "help should list 'ads': {stdout}");
    assert!(stdout.contains("sites"), "help should list 'sites': {stdout}");
}

// ── Ad blocks ────────────────────────────────────────────────────────

#[test]
fn fresh_board_lists_five_empty_slots() {
    let (_dir, db) = temp_db();
    let rows = run_json(&db, &["ads", "list"]);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["position"], "Верхний блок");
    assert_eq!(rows[4]["position"], "Нижний блок");
    assert!(rows.iter().all(|r| r["configured"] == false));
}

#[test]
fn set_code_persists_across_invocations() {
    let (_dir, db) = temp_db();
    let (code, stdout, _) = run(&db, &["ads", "set", "3", "--code", "<script>A</script>"]);
    assert_eq!(code, 0);
    assert!(
        stdout.contains("Рекламный код для \"Центральный блок\" успешно обновлен"),
        "missing notice: {stdout}"
    );

    let block = run_json(&db, &["ads", "show", "3"]);
    assert_eq!(block["code"], "<script>A</script>");

    let rows = run_json(&db, &["ads", "list"]);
    let configured: Vec<u64> = rows
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["configured"] == true)
        .map(|r| r["id"].as_u64().unwrap())
        .collect();
    assert_eq!(configured, vec![3]);
}

#[test]
fn set_code_from_file() {
    let (dir, db) = temp_db();
    let snippet = dir.path().join("ad.html");
    std::fs::write(&snippet, "<div id=\"yandex_rtb\"></div>").unwrap();

    let (code, _, stderr) = run(&db, &["ads", "set", "1", "--file", snippet.to_str().unwrap()]);
    assert_eq!(code, 0, "{stderr}");
    let block = run_json(&db, &["ads", "show", "1"]);
    assert_eq!(block["code"], "<div id=\"yandex_rtb\"></div>");
}

#[test]
fn clear_code_empties_the_slot() {
    let (_dir, db) = temp_db();
    run(&db, &["ads", "set", "2", "--code", "<b/>"]);
    let (code, stdout, _) = run(&db, &["ads", "clear", "2"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Рекламный блок очищен"), "{stdout}");

    let block = run_json(&db, &["ads", "show", "2"]);
    assert_eq!(block["code"], "");
}

#[test]
fn unknown_slot_fails_with_message() {
    let (_dir, db) = temp_db();
    let (code, _, stderr) = run(&db, &["ads", "set", "9", "--code", "x"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("ad block not found: 9"), "{stderr}");
}

// ── Websites ─────────────────────────────────────────────────────────

#[test]
fn add_site_gets_next_id() {
    let (_dir, db) = temp_db();
    let created = run_json(
        &db,
        &[
            "sites", "add", "--title", "Site3", "--url", "http://x", "--description", "d",
            "--image", "i",
        ],
    );
    assert_eq!(created["id"], 3);

    let sites = run_json(&db, &["sites", "list"]);
    assert_eq!(sites.as_array().unwrap().len(), 3);
}

#[test]
fn update_changes_only_given_fields() {
    let (_dir, db) = temp_db();
    let before = run_json(&db, &["sites", "show", "1"]);
    let after = run_json(&db, &["sites", "update", "1", "--title", "X"]);
    assert_eq!(after["title"], "X");
    assert_eq!(after["url"], before["url"]);
    assert_eq!(after["description"], before["description"]);
    assert_eq!(after["image"], before["image"]);
}

#[test]
fn update_without_fields_is_rejected() {
    let (_dir, db) = temp_db();
    let (code, _, stderr) = run(&db, &["sites", "update", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nothing to update"), "{stderr}");
}

#[test]
fn remove_site_then_list() {
    let (_dir, db) = temp_db();
    let (code, stdout, _) = run(&db, &["sites", "remove", "1"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Сайт удален"), "{stdout}");

    let sites = run_json(&db, &["sites", "list"]);
    let sites = sites.as_array().unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0]["id"], 2);

    let (code, _, stderr) = run(&db, &["sites", "remove", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("website not found: 1"), "{stderr}");
}

#[test]
fn blank_title_is_rejected() {
    let (_dir, db) = temp_db();
    let (code, _, stderr) = run(&db, &["sites", "add", "--title", " ", "--url", "http://x"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("website title must not be empty"), "{stderr}");
}

// ── Rejected data ────────────────────────────────────────────────────

/// Helper: write raw bytes under `key` in the redb file at `db`.
fn seed_raw(db: &Path, key: &str, bytes: &[u8]) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let backend = RedbBackend::open(db).unwrap();
        backend.put(key, bytes).await.unwrap();
    });
}

fn read_raw(db: &Path, key: &str) -> Option<Vec<u8>> {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async { RedbBackend::open(db).unwrap().get(key).await.unwrap() })
}

#[test]
fn corrupt_sites_warn_and_keep_a_backup() {
    let (_dir, db) = temp_db();
    let original = br#"[{"id":1,"title":"mine","url":"http://m","description":"","image":""},{"id":2.0}]"#;
    seed_raw(&db, "websites", original);

    let (code, _, stderr) = run(&db, &["sites", "remove", "2"]);
    assert_eq!(code, 0, "remove failed: {stderr}");
    assert!(
        stderr.contains("warning: stored 'websites' was not loaded"),
        "expected a load warning: {stderr}"
    );
    assert!(stderr.contains("websites.corrupt"), "backup key not named: {stderr}");

    assert_eq!(read_raw(&db, "websites.corrupt"), Some(original.to_vec()));
    let sites = run_json(&db, &["sites", "list"]);
    assert_eq!(sites.as_array().unwrap().len(), 1);
}
