//! End-to-end tests for the `cookie-relay` binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STORE_ENV: &[&str] = &[
    "APPWRITE_PROJECT_ID",
    "APPWRITE_API_KEY",
    "SUPABASE_URL",
    "SUPABASE_SERVICE_ROLE_KEY",
    "STORE_KEY",
    "COOKIE_STORE_PATH",
    "STORE_CONNECT_TIMEOUT_SECS",
    "STORE_READ_TIMEOUT_SECS",
    "RUST_LOG",
];

/// Binary with every store-selecting variable cleared so tests always use
/// the file backend.
fn relay() -> Command {
    let mut cmd = Command::cargo_bin("cookie-relay").unwrap();
    for name in STORE_ENV {
        cmd.env_remove(name);
    }
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    relay()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("cookies"));
}

#[test]
fn test_binary_version_displays_version() {
    relay()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_binary_requires_subcommand() {
    relay().assert().failure();
}

#[test]
fn test_cookies_set_list_remove_clear_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("jar.json");
    let store = store.to_str().unwrap();

    relay()
        .args(["cookies", "set", "example.com", "sid", "abc123", "--store-path", store])
        .args(["--path", "/app", "--secure", "--expires", "2099-01-01T00:00:00Z"])
        .assert()
        .success();
    relay()
        .args(["cookies", "set", "example.com", "theme", "dark", "--store-path", store])
        .assert()
        .success();

    let output = relay()
        .args(["cookies", "list", "--store-path", store])
        .output()
        .unwrap();
    assert!(output.status.success());
    let jar: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(jar["example.com"]["sid"]["value"], "abc123");
    assert_eq!(jar["example.com"]["sid"]["path"], "/app");
    assert_eq!(jar["example.com"]["sid"]["secure"], true);
    assert_eq!(jar["example.com"]["theme"]["path"], "/");

    relay()
        .args(["cookies", "remove", "example.com", "sid", "--store-path", store])
        .assert()
        .success();
    relay()
        .args(["cookies", "list", "--store-path", store])
        .assert()
        .success()
        .stdout(predicate::str::contains("theme"))
        .stdout(predicate::str::contains("abc123").not());

    relay()
        .args(["cookies", "clear", "--store-path", store])
        .assert()
        .success();
    relay()
        .args(["cookies", "list", "--store-path", store])
        .assert()
        .success()
        .stdout(predicate::str::diff("{}\n"));
}

#[test]
fn test_cookies_set_encrypts_when_store_key_present() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("jar.json");

    relay()
        .env("STORE_KEY", "cli-secret")
        .env("COOKIE_STORE_PATH", &store)
        .args(["cookies", "set", "example.com", "sid", "hidden-value"])
        .assert()
        .success();

    let raw = std::fs::read_to_string(&store).unwrap();
    assert!(!raw.contains("hidden-value"));
    assert!(raw.contains("authTag"));

    relay()
        .env("STORE_KEY", "cli-secret")
        .env("COOKIE_STORE_PATH", &store)
        .args(["cookies", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hidden-value"));
}

#[test]
fn test_status_reports_file_backend() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("jar.json");

    relay()
        .arg("status")
        .arg("--store-path")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("backend = file"))
        .stdout(predicate::str::contains("encrypted = false"))
        .stdout(predicate::str::contains("appwrite = false"))
        .stdout(predicate::str::contains("supabase = false"));

    relay()
        .env("STORE_KEY", "cli-secret")
        .arg("status")
        .arg("--store-path")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("encrypted = true"))
        .stdout(predicate::str::contains("cli-secret").not());
}

#[test]
fn test_status_reports_supabase_when_configured() {
    relay()
        .env("SUPABASE_URL", "https://project.supabase.example")
        .env("SUPABASE_SERVICE_ROLE_KEY", "service-role")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("backend = supabase"))
        .stdout(predicate::str::contains("supabase = true"))
        .stdout(predicate::str::contains("service-role").not());
}

#[test]
fn test_invalid_timeout_env_is_an_error() {
    relay()
        .env("STORE_READ_TIMEOUT_SECS", "soon")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("STORE_READ_TIMEOUT_SECS"));
}

#[test]
fn test_heartbeat_once_fails_when_server_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    relay()
        .args(["heartbeat", "--once", "--url"])
        .arg(format!("http://127.0.0.1:{port}"))
        .assert()
        .failure();
}

#[test]
fn test_heartbeat_rejects_non_http_url() {
    relay()
        .args(["heartbeat", "--once", "--url", "ftp://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http or https"));
}
