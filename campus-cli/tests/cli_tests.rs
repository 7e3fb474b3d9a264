use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

const UNREACHABLE_API: &str = "http://127.0.0.1:9/api";

#[test]
fn test_cli_no_args() {
    let mut cmd = cargo_bin_cmd!("cli");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("cli");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("conversations"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("config"));
}

#[test]
#[serial]
fn test_config_prints_env_overrides_as_json() {
    let mut cmd = cargo_bin_cmd!("cli");
    cmd.env("CAMPUS_API_BASE_URL", "https://campus.example/api")
        .env("CAMPUS_PER_PAGE", "40")
        .args(["config", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"api_base_url\": \"https://campus.example/api\""))
        .stdout(predicate::str::contains("\"per_page\": 40"));
}

#[test]
#[serial]
fn test_config_reads_yaml_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("campus.yaml");
    fs::write(&path, "per_page: 50\nlog_level: warn\n").unwrap();

    let mut cmd = cargo_bin_cmd!("cli");
    cmd.env_remove("CAMPUS_PER_PAGE")
        .env_remove("CAMPUS_LOG_LEVEL")
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("per_page: 50"))
        .stdout(predicate::str::contains("log_level: warn"));
}

#[test]
fn test_config_rejects_unknown_format() {
    let mut cmd = cargo_bin_cmd!("cli");
    cmd.args(["config", "--format", "toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("toml"));
}

#[test]
#[serial]
fn test_invalid_config_value_is_reported() {
    let mut cmd = cargo_bin_cmd!("cli");
    cmd.env("CAMPUS_PER_PAGE", "many")
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn test_list_rejects_malformed_filter() {
    let mut cmd = cargo_bin_cmd!("cli");
    cmd.args(["list", "students", "--filter", "level"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected key=value"));
}

#[test]
fn test_conversations_require_user_id() {
    let mut cmd = cargo_bin_cmd!("cli");
    cmd.env("CAMPUS_API_BASE_URL", UNREACHABLE_API)
        .arg("conversations")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user-id is required"));
}

#[test]
#[serial]
fn test_list_reports_unreachable_api() {
    let mut cmd = cargo_bin_cmd!("cli");
    cmd.env("CAMPUS_API_BASE_URL", UNREACHABLE_API)
        .env("CAMPUS_REQUEST_TIMEOUT_SECS", "5")
        .args(["list", "students", "--page", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to list students"));
}

#[test]
#[serial]
fn test_show_reports_unreachable_api() {
    let mut cmd = cargo_bin_cmd!("cli");
    cmd.env("CAMPUS_API_BASE_URL", UNREACHABLE_API)
        .env("CAMPUS_REQUEST_TIMEOUT_SECS", "5")
        .args(["show", "students", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to fetch students/7"));
}
