//! CLI integration tests for the Campus Ride command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Invalid inputs are rejected before any request is made
//!
//! Note: These tests do not require a running API - commands that reach the
//! network are pointed at an unreachable address or a local mock server.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a command for the campus-ride binary with an isolated config dir.
fn campus_ride(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("campus-ride").unwrap();
    cmd.env("CAMPUS_RIDE_CONFIG_DIR", config_dir.path())
        .env_remove("CAMPUS_RIDE_API_URL")
        .env_remove("CAMPUS_RIDE_PASSWORD")
        .current_dir(config_dir.path());
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Campus Ride"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("campus-ride"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("profile"))
        .stdout(predicate::str::contains("wallet"))
        .stdout(predicate::str::contains("banks"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_wallet_help() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .args(["wallet", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("topup"))
        .stdout(predicate::str::contains("withdraw"))
        .stdout(predicate::str::contains("history"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Validation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir).arg("drive").assert().failure();
}

#[test]
fn test_switch_rejects_unknown_mode() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .args(["profile", "switch", "pilot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown profile mode"));
}

#[test]
fn test_verify_rejects_unknown_document() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .args(["verify", "upload", "passport", "scan.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown document kind"));
}

#[test]
fn test_topup_below_minimum_fails_locally() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .args(["--server", "http://127.0.0.1:1", "wallet", "topup", "5000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least"));
}

#[test]
fn test_unreachable_server_reports_transport_error() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .args(["--server", "http://127.0.0.1:1", "banks"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Không thể kết nối"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_session_exits_with_login_hint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wallet"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("access_token"), "stale").unwrap();
    std::fs::write(data_dir.join("refresh_token"), "ref-old").unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        format!("[storage]\ndata_dir = '{}'\n", data_dir.display()),
    )
    .unwrap();

    let mut cmd = campus_ride(&dir);
    cmd.args(["--server", &server.uri(), "wallet", "balance"]);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert
        .code(2)
        .stderr(predicate::str::contains("session has expired"));

    assert!(!data_dir.join("access_token").exists());

    // The file log is flushed before the early exit.
    let logs: String = std::fs::read_dir(dir.path().join("logs"))
        .unwrap()
        .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect();
    assert!(logs.contains("Token refresh failed, clearing session"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Local Commands
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_whoami_when_logged_out() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .args(["config", "set", "storage.data_dir"])
        .arg(dir.path().join("data"))
        .assert()
        .success();

    campus_ride(&dir)
        .args(["auth", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_config_init_and_show() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    campus_ride(&dir)
        .args(["config", "set", "api.base_url", "https://api.campusride.vn"])
        .assert()
        .success();

    campus_ride(&dir)
        .args(["--json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://api.campusride.vn"));
}

#[test]
fn test_server_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .args(["--server", "http://localhost:9999", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:9999"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    campus_ride(&dir)
        .args(["config", "set", "llm.model", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}
